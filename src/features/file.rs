use crate::annotation::FeatureMap;
use crate::error::{Result, TreeError};
use crate::features::FeatureSource;
use std::fs;
use std::path::PathBuf;

/// Features stored locally as `{"CD4": {"AAAC-1": 2.5, ...}, ...}`.
pub struct JsonFileFeatureSource {
    path: PathBuf,
}

impl JsonFileFeatureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every feature in the file.
    pub fn load_all(&self) -> Result<FeatureMap> {
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            TreeError::InvalidUploadFormat(format!("feature file {}: {}", self.path.display(), e))
        })
    }
}

impl FeatureSource for JsonFileFeatureSource {
    fn fetch(&self, features: &[String]) -> Result<FeatureMap> {
        let mut all = self.load_all()?;
        all.retain(|name, _| features.contains(name));
        for missing in features.iter().filter(|f| !all.contains_key(*f)) {
            log::warn!("Feature {} not found in {}", missing, self.path.display());
        }
        Ok(all)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
