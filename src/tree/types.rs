use crate::annotation::{AttributeMap, AttributeValue};
use crate::error::{Result, TreeError};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Identity assigned to every node when a tree is flattened. Copies and
/// pruned derivations keep it, so it is what prune history refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(NodeId)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    #[serde(rename = "unCell")]
    pub un_cell: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CellRow {
    #[serde(rename = "unRow")]
    pub un_row: u64,
}

/// One cell record as stored on a leaf of the cluster tree.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CellItem {
    #[serde(rename = "_barcode")]
    pub barcode: Barcode,
    #[serde(rename = "_cellRow", default)]
    pub cell_row: CellRow,
}

impl CellItem {
    pub fn new(barcode: impl Into<String>, row: u64) -> Self {
        Self {
            barcode: Barcode {
                un_cell: barcode.into(),
            },
            cell_row: CellRow { un_row: row },
        }
    }

    pub fn barcode(&self) -> &str {
        &self.barcode.un_cell
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RawMeta {
    #[serde(rename = "_item", alias = "items", default)]
    pub items: Option<Vec<CellItem>>,
    #[serde(rename = "_distance", alias = "distance", default)]
    pub distance: Option<f64>,
    #[serde(rename = "_significance", alias = "significance", default)]
    pub significance: Option<f64>,
}

/// Deepest tree accepted from input. Tree passes recurse once per level, so
/// deeper inputs are rejected as malformed instead of exhausting the stack.
pub const MAX_TREE_DEPTH: usize = 256;

/// JSON nesting allowed for a tree of [`MAX_TREE_DEPTH`] levels: two per
/// level plus the leaf's item records.
const MAX_JSON_NESTING: usize = 2 * MAX_TREE_DEPTH + 8;

/// A node of the nested `[meta, [children...]]` cluster tree file format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    pub meta: Option<RawMeta>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(meta: RawMeta, children: Vec<RawNode>) -> Self {
        Self {
            meta: Some(meta),
            children,
        }
    }

    pub fn leaf(items: Vec<CellItem>) -> Self {
        Self::new(
            RawMeta {
                items: Some(items),
                ..RawMeta::default()
            },
            Vec::new(),
        )
    }

    pub fn branch(distance: Option<f64>, children: Vec<RawNode>) -> Self {
        Self::new(
            RawMeta {
                distance,
                ..RawMeta::default()
            },
            children,
        )
    }

    /// Parse a cluster tree document. The recursion limit is lifted because
    /// every tree level costs two levels of JSON nesting; nesting is bounded
    /// up front instead.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let nesting = json_nesting(data);
        if nesting > MAX_JSON_NESTING {
            return Err(TreeError::MalformedTree(format!(
                "tree nests {} levels of JSON, more than a {} level tree needs",
                nesting, MAX_TREE_DEPTH
            )));
        }
        let mut deserializer = serde_json::Deserializer::from_str(data);
        deserializer.disable_recursion_limit();
        let value = Value::deserialize(&mut deserializer)?;
        deserializer.end()?;
        RawNode::try_from(value)
    }
}

impl TryFrom<Value> for RawNode {
    type Error = TreeError;

    fn try_from(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Array(entries) => entries,
            other => {
                return Err(TreeError::MalformedTree(format!(
                    "expected a node array, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut node = RawNode::default();
        for entry in entries {
            match entry {
                Value::Object(_) if node.meta.is_none() => {
                    node.meta = Some(serde_json::from_value(entry)?);
                }
                Value::Object(_) | Value::Null => {}
                Value::Array(children) => {
                    for child in children {
                        node.children.push(RawNode::try_from(child)?);
                    }
                }
                other => {
                    return Err(TreeError::MalformedTree(format!(
                        "unexpected {} inside a node",
                        json_kind(&other)
                    )))
                }
            }
        }
        Ok(node)
    }
}

impl Serialize for RawNode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let default_meta = RawMeta::default();
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.meta.as_ref().unwrap_or(&default_meta))?;
        tuple.serialize_element(&self.children)?;
        tuple.end()
    }
}

/// Deepest bracket nesting in a JSON document, strings skipped.
fn json_nesting(data: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for byte in data.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The working node of a cluster tree.
///
/// `children == None` marks a leaf, whether the node never had children or
/// was pruned at this point. `value` is the cell count of the node's subtree
/// in the tree it was built from; pruning never changes it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    pub node_id: usize,
    pub depth: usize,
    pub value: usize,
    pub distance: Option<f64>,
    pub significance: Option<f64>,
    pub items: Option<Arc<[CellItem]>>,
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub label_count: AttributeMap,
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub feature_count: AttributeMap,
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub feature_hi_los: AttributeMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_annotation: Option<AttributeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub(crate) fn new(
        id: NodeId,
        parent_id: Option<NodeId>,
        items: Option<Arc<[CellItem]>>,
        distance: Option<f64>,
        significance: Option<f64>,
    ) -> Self {
        Self {
            id,
            parent_id,
            node_id: 0,
            depth: 0,
            value: 0,
            distance,
            significance,
            items,
            label_count: AttributeMap::new(),
            feature_count: AttributeMap::new(),
            feature_hi_los: AttributeMap::new(),
            user_annotation: None,
            children: None,
        }
    }

    /// Cells stored directly on this node (only leaves of the built tree have any).
    pub fn own_items(&self) -> &[CellItem] {
        self.items.as_deref().unwrap_or(&[])
    }
}
