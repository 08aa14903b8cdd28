use crate::export::{deserialize_optional_datetime, serialize_optional_datetime};
use crate::history::{PruneHistory, PruneStep};
use crate::prune::pruner::optional_value_pruner;
use crate::prune::ValuePruner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayToggles {
    pub pies_visible: bool,
    pub stroke_visible: bool,
    pub node_ids_visible: bool,
    pub node_counts_visible: bool,
    pub distance_visible: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            pies_visible: true,
            stroke_visible: false,
            node_ids_visible: false,
            node_counts_visible: false,
            distance_visible: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScaleVariant {
    LabelCount,
    FeatureCount,
    FeatureHiLos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScaleExport {
    pub variant: ColorScaleVariant,
    #[serde(default)]
    pub label_domain: Vec<String>,
    #[serde(default)]
    pub label_range: Vec<String>,
    #[serde(default)]
    pub feature_hi_lo_domain: Vec<String>,
    #[serde(default)]
    pub feature_hi_lo_range: Vec<String>,
    #[serde(default)]
    pub feature_hi_lo_thresholds: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_gradient_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleExport {
    #[serde(rename = "branchsizeScaleRange", default, skip_serializing_if = "Option::is_none")]
    pub branch_size_scale_range: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pie_scale_range: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<ColorScaleExport>,
}

/// The threshold half of a prune step; clicks are not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedStep {
    #[serde(with = "optional_value_pruner", default)]
    pub value_pruner: Option<ValuePruner>,
}

/// Saved view: prune thresholds, feature selection, display toggles and
/// scale settings. Loading it back replays the thresholds on a fresh tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateExport {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub optional_display_elements: DisplayToggles,
    #[serde(default)]
    pub prune_state: Vec<ExportedStep>,
    #[serde(default)]
    pub scales: ScaleExport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(rename = "fontsize", default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_datetime",
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
}

impl StateExport {
    /// Snapshot the threshold prunes of every step of `history`.
    pub fn capture(history: &PruneHistory, features: Vec<String>, scales: ScaleExport, width: f64) -> Self {
        let prune_state = history
            .steps()
            .iter()
            .map(|step| ExportedStep {
                value_pruner: step.value_pruner,
            })
            .collect();
        Self {
            features,
            optional_display_elements: DisplayToggles::default(),
            prune_state,
            scales,
            width: Some(width),
            font_size: None,
            exported_at: Some(Utc::now()),
            tool_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    /// A history with one step per saved threshold and the last one active.
    pub fn to_history(&self) -> PruneHistory {
        PruneHistory::from_steps(
            self.prune_state
                .iter()
                .map(|step| PruneStep {
                    value_pruner: step.value_pruner,
                    click_prune_history: Vec::new(),
                })
                .collect(),
        )
    }

    /// Saved high/low thresholds, if a hi/lo color scale was exported.
    pub fn thresholds(&self) -> BTreeMap<String, f64> {
        self.scales
            .color_scale
            .as_ref()
            .map(|scale| scale.feature_hi_lo_thresholds.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prune::ClickPruner;
    use crate::tree::NodeId;
    use serde_json::json;

    #[test]
    fn reads_saved_view() {
        let saved = json!({
            "features": ["CD4"],
            "optionalDisplayElements": {
                "piesVisible": false,
                "strokeVisible": true,
                "nodeIdsVisible": true,
                "nodeCountsVisible": false,
                "distanceVisible": false
            },
            "pruneState": [
                {"valuePruner": {"key": "minSize", "value": 10}},
                {"valuePruner": {}}
            ],
            "scales": {
                "branchsizeScaleRange": [0.01, 20],
                "colorScale": {
                    "variant": "featureHiLos",
                    "featureHiLoThresholds": {"CD4": 1.5}
                }
            },
            "width": 800,
            "fontsize": 14,
            "exportedAt": "2024-03-01T12:00:00+00:00"
        });
        let state: StateExport = serde_json::from_value(saved).unwrap();

        assert!(!state.optional_display_elements.pies_visible);
        assert_eq!(state.scales.branch_size_scale_range, Some([0.01, 20.0]));
        assert_eq!(state.thresholds()["CD4"], 1.5);
        assert_eq!(state.font_size, Some(14.0));
        assert_eq!(serde_json::to_value(&state).unwrap()["fontsize"], 14.0);
        assert_eq!(state.exported_at.unwrap().to_rfc3339(), "2024-03-01T12:00:00+00:00");

        let history = state.to_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history.active_step_index(), 1);
        assert_eq!(history.steps()[0].value_pruner, Some(ValuePruner::MinSize(10.0)));
        assert!(history.active_step().is_empty());
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let state: StateExport = serde_json::from_value(json!({})).unwrap();
        assert!(state.optional_display_elements.pies_visible);
        assert_eq!(state.to_history().len(), 1);
        assert!(state.exported_at.is_none());
    }

    #[test]
    fn capture_drops_clicks_but_keeps_every_step() {
        let mut history = PruneHistory::new();
        history.set_value_pruner(0, ValuePruner::MinDepth(4.0)).unwrap();
        history.add_click_prune(0, ClickPruner::SetCollapsedNode(NodeId(2))).unwrap();
        history.apply();
        history.apply();
        history.revert_to_step(1).unwrap();

        let state = StateExport::capture(&history, vec![], ScaleExport::default(), 1000.0);
        assert_eq!(state.prune_state.len(), 3);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["pruneState"][0]["valuePruner"]["key"], "minDepth");
        assert_eq!(json["pruneState"][1]["valuePruner"], json!({}));
        assert_eq!(json["pruneState"][2]["valuePruner"], json!({}));
        assert!(json.get("fontsize").is_none());
        assert!(json["exportedAt"].is_string());
        assert!(json.get("tool_version").is_none());
    }
}
