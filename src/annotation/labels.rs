use crate::annotation::{aggregate_bottom_up, csv_reader, upload_error, AttributeMap, AttributeValue};
use crate::error::{Result, TreeError};
use crate::tree::{NodeId, TreeNode};
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_LABEL: &str = "Label Not Provided";

/// Barcode to label lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    labels: HashMap<String, String>,
}

impl LabelMap {
    /// Parse a labels CSV. The header must name `item` and `label` columns,
    /// or have exactly two columns (barcode first).
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = csv_reader(text);
        let headers = reader.headers().map_err(upload_error)?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(TreeError::InvalidUploadFormat("labels file is empty".to_string()));
        }

        let (item_col, label_col) = match (
            headers.iter().position(|c| c == "item"),
            headers.iter().position(|c| c == "label"),
        ) {
            (Some(item), Some(label)) => (item, label),
            _ if headers.len() == 2 => (0, 1),
            _ => {
                return Err(TreeError::InvalidUploadFormat(format!(
                    "labels header must contain item and label columns, got '{}'",
                    headers.iter().collect::<Vec<_>>().join(",")
                )))
            }
        };

        let mut labels = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(upload_error)?;
            if let (Some(item), Some(label)) = (record.get(item_col), record.get(label_col)) {
                let label = if label.is_empty() { DEFAULT_LABEL } else { label };
                labels.insert(item.to_string(), label.to_string());
            }
        }

        log::info!("Loaded {} cell labels", labels.len());
        Ok(Self { labels })
    }

    pub fn insert(&mut self, barcode: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(barcode.into(), label.into());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_for(&self, barcode: &str) -> &str {
        self.labels.get(barcode).map_or(DEFAULT_LABEL, String::as_str)
    }

    /// Sorted distinct labels, the domain of an ordinal color scale.
    pub fn ordinal_domain(&self) -> Vec<String> {
        self.labels
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Cells per label under every node of `base`.
    pub fn label_counts(&self, base: &TreeNode) -> HashMap<NodeId, AttributeMap> {
        aggregate_bottom_up(base, |items| {
            let mut counts = AttributeMap::new();
            for item in items {
                let label = self.label_for(item.barcode());
                counts
                    .entry(label.to_string())
                    .and_modify(|v| v.quantity += 1.0)
                    .or_insert_with(|| AttributeValue::labelled(label, 1.0));
            }
            counts
        })
    }
}
