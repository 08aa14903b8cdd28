use crate::annotation::FeatureMap;
use crate::error::{Result, TreeError};
use crate::features::FeatureSource;
use crate::progress::spinner;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// One row of a feature query response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureRecord {
    pub feature: String,
    pub id: String,
    pub value: f64,
}

/// Queries `GET {base}/api/features?q=<feature>` once per feature.
pub struct HttpFeatureSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpFeatureSource {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn query_url(&self, feature: &str) -> Result<Url> {
        let endpoint = format!("{}/api/features", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&endpoint, &[("q", feature)])
            .map_err(|e| TreeError::InvalidFeatureSource(format!("bad feature url {}: {}", endpoint, e)))
    }

    fn fetch_one(&self, feature: &str) -> Result<Vec<FeatureRecord>> {
        let url = self.query_url(feature)?;
        let records = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<Vec<FeatureRecord>>()?;
        Ok(records)
    }
}

/// Fold response rows into the store layout. Rows for other features are
/// kept; the server may return aliases.
pub fn records_to_feature_map(records: Vec<FeatureRecord>) -> FeatureMap {
    let mut map = FeatureMap::new();
    for record in records {
        map.entry(record.feature).or_default().insert(record.id, record.value);
    }
    map
}

impl FeatureSource for HttpFeatureSource {
    fn fetch(&self, features: &[String]) -> Result<FeatureMap> {
        let progress = spinner(format!("Fetching {} features...", features.len()));

        let mut map = FeatureMap::new();
        for feature in features {
            progress.set_message(format!("Fetching feature {}...", feature));
            let records = self.fetch_one(feature)?;
            if records.is_empty() {
                log::warn!("Feature {} returned no values", feature);
            }
            for (name, values) in records_to_feature_map(records) {
                map.entry(name).or_default().extend(values);
            }
        }

        progress.finish_with_message(format!("Fetched {} features", map.len()));
        Ok(map)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
