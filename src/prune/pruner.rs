use crate::error::Result;
use crate::prune::click::{collapse_node, set_root_node};
use crate::prune::value::{
    prune_by_depth, prune_by_min_distance, prune_by_min_distance_search, prune_by_min_value,
};
use crate::tree::{NodeId, TreeNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A threshold prune. Serialized as `{"key": "minSize", "value": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum ValuePruner {
    MinSize(f64),
    MinDistance(f64),
    MinDistanceSearch(f64),
    MinDepth(f64),
}

impl ValuePruner {
    pub fn apply(&self, tree: &TreeNode) -> TreeNode {
        match *self {
            ValuePruner::MinSize(t) => prune_by_min_value(tree, t),
            ValuePruner::MinDistance(t) => prune_by_min_distance(tree, t),
            ValuePruner::MinDistanceSearch(t) => prune_by_min_distance_search(tree, t),
            ValuePruner::MinDepth(t) => prune_by_depth(tree, t),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ValuePruner::MinSize(_) => "minSize",
            ValuePruner::MinDistance(_) => "minDistance",
            ValuePruner::MinDistanceSearch(_) => "minDistanceSearch",
            ValuePruner::MinDepth(_) => "minDepth",
        }
    }

    pub fn threshold(&self) -> f64 {
        match *self {
            ValuePruner::MinSize(t)
            | ValuePruner::MinDistance(t)
            | ValuePruner::MinDistanceSearch(t)
            | ValuePruner::MinDepth(t) => t,
        }
    }

    pub fn from_key(key: &str, threshold: f64) -> Option<Self> {
        match key {
            "minSize" => Some(ValuePruner::MinSize(threshold)),
            "minDistance" => Some(ValuePruner::MinDistance(threshold)),
            "minDistanceSearch" => Some(ValuePruner::MinDistanceSearch(threshold)),
            "minDepth" => Some(ValuePruner::MinDepth(threshold)),
            _ => None,
        }
    }
}

impl fmt::Display for ValuePruner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.threshold())
    }
}

/// Parses the `key=threshold` form used on the command line.
impl FromStr for ValuePruner {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key, threshold) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=threshold, got '{}'", s))?;
        let threshold: f64 = threshold
            .trim()
            .parse()
            .map_err(|e| format!("invalid threshold '{}': {}", threshold, e))?;
        ValuePruner::from_key(key.trim(), threshold).ok_or_else(|| {
            format!(
                "unknown pruner '{}' (expected minSize, minDistance, minDistanceSearch or minDepth)",
                key
            )
        })
    }
}

/// A prune tied to one clicked node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum ClickPruner {
    SetRootNode(NodeId),
    SetCollapsedNode(NodeId),
}

impl ClickPruner {
    pub fn apply(&self, tree: &TreeNode) -> Result<TreeNode> {
        match *self {
            ClickPruner::SetRootNode(id) => set_root_node(tree, id),
            ClickPruner::SetCollapsedNode(id) => collapse_node(tree, id),
        }
    }

    pub fn node(&self) -> NodeId {
        match *self {
            ClickPruner::SetRootNode(id) | ClickPruner::SetCollapsedNode(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pruner {
    Value(ValuePruner),
    Click(ClickPruner),
}

impl Pruner {
    pub fn apply(&self, tree: &TreeNode) -> Result<TreeNode> {
        match self {
            Pruner::Value(pruner) => Ok(pruner.apply(tree)),
            Pruner::Click(pruner) => pruner.apply(tree),
        }
    }
}

impl From<ValuePruner> for Pruner {
    fn from(pruner: ValuePruner) -> Self {
        Pruner::Value(pruner)
    }
}

impl From<ClickPruner> for Pruner {
    fn from(pruner: ClickPruner) -> Self {
        Pruner::Click(pruner)
    }
}

/// Serde adapter for an optional value pruner that is written as `{}` when
/// unset, the shape saved state files use.
pub mod optional_value_pruner {
    use super::ValuePruner;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    pub fn serialize<S>(pruner: &Option<ValuePruner>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match pruner {
            Some(pruner) => pruner.serialize(serializer),
            None => Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ValuePruner>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::tree::test_support::sample_tree;
    use serde_json::json;

    #[test]
    fn value_pruner_wire_shape() {
        let pruner = ValuePruner::MinDistanceSearch(0.25);
        assert_eq!(
            serde_json::to_value(pruner).unwrap(),
            json!({"key": "minDistanceSearch", "value": 0.25})
        );
        let parsed: ValuePruner =
            serde_json::from_value(json!({"key": "minSize", "value": 4})).unwrap();
        assert_eq!(parsed, ValuePruner::MinSize(4.0));
    }

    #[test]
    fn click_pruner_wire_shape() {
        let click = ClickPruner::SetCollapsedNode(NodeId(7));
        assert_eq!(
            serde_json::to_value(click).unwrap(),
            json!({"key": "setCollapsedNode", "value": 7})
        );
    }

    #[test]
    fn parses_command_line_form() {
        assert_eq!("minDepth=3".parse::<ValuePruner>(), Ok(ValuePruner::MinDepth(3.0)));
        assert!("minDepth".parse::<ValuePruner>().is_err());
        assert!("maxSize=3".parse::<ValuePruner>().is_err());
        assert!("minSize=abc".parse::<ValuePruner>().is_err());
    }

    #[test]
    fn pruner_dispatch() {
        let tree = sample_tree();
        let by_value = Pruner::from(ValuePruner::MinSize(4.0)).apply(&tree).unwrap();
        assert_eq!(by_value.node_count(), 3);

        let missing = Pruner::from(ClickPruner::SetRootNode(NodeId(99))).apply(&tree);
        assert!(matches!(missing, Err(TreeError::NodeNotFound(_))));
    }

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "optional_value_pruner", default)]
        pruner: Option<ValuePruner>,
    }

    #[test]
    fn empty_object_means_no_pruner() {
        let holder: Holder = serde_json::from_value(json!({"pruner": {}})).unwrap();
        assert!(holder.pruner.is_none());
        assert_eq!(serde_json::to_value(&holder).unwrap(), json!({"pruner": {}}));

        let holder: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(holder.pruner.is_none());
    }
}
