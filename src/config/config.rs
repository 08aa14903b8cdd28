use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_bin_count")]
    pub bin_count: usize,
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,
    #[serde(default)]
    pub feature_api_url: Option<String>,
    #[serde(default = "default_branch_size_scale_range")]
    pub branch_size_scale_range: [f64; 2],
    #[serde(default = "default_pie_scale_range")]
    pub pie_scale_range: [f64; 2],
}

fn default_width() -> f64 {
    1000.0
}

fn default_bin_count() -> usize {
    50
}

fn default_download_timeout() -> u64 {
    300
}

fn default_branch_size_scale_range() -> [f64; 2] {
    [0.01, 20.0]
}

fn default_pie_scale_range() -> [f64; 2] {
    [5.0, 20.0]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: default_width(),
            bin_count: default_bin_count(),
            download_timeout: default_download_timeout(),
            feature_api_url: None,
            branch_size_scale_range: default_branch_size_scale_range(),
            pie_scale_range: default_pie_scale_range(),
        }
    }
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "tmc", "cluster-tree-tools")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }
        Config::default()
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path).map(|content| toml::from_str(&content)) {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Config::default()
            }
            Err(_) => Config::default(),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str("width = 640.0\nfeature_api_url = \"http://localhost:8080\"\n").unwrap();
        assert_eq!(config.width, 640.0);
        assert_eq!(config.bin_count, 50);
        assert_eq!(config.feature_api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.pie_scale_range, [5.0, 20.0]);
    }

    #[test]
    fn full_file_overrides_every_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            bin_count: 20,
            width: 800.0,
            ..Config::default()
        };
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "width = \"wide\"").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("missing.toml")), Config::default());
    }
}
