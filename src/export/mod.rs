//! Downloadable artifacts: node metadata CSV, JSON tree dumps, the nested
//! cluster-tree format and saved view state.

pub mod formats;

use chrono::{DateTime, Utc};
use serde::de::{Deserialize as DeserializeTrait, Deserializer, Error};
use serde::ser::Serializer;

pub use formats::nodes::{node_rows, to_cluster_tree, write_cluster_tree, write_node_csv, write_tree_json, NodeRow};
pub use formats::state::{
    ColorScaleExport, ColorScaleVariant, DisplayToggles, ExportedStep, ScaleExport, StateExport,
};

pub(crate) fn serialize_optional_datetime<S>(
    date: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serializer.serialize_str(&date.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    })
    .transpose()
}
