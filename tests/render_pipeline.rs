use cluster_tree_tools::cli::RenderArgs;
use cluster_tree_tools::commands::{render, stats};
use cluster_tree_tools::config::Config;
use cluster_tree_tools::tree::{build_tree, CellItem, RawNode};
use cluster_tree_tools::ValuePruner;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cells(prefix: &str, count: usize) -> Vec<CellItem> {
    (0..count)
        .map(|i| CellItem::new(format!("{}-{}", prefix, i), i as u64))
        .collect()
}

fn write_inputs(dir: &Path) -> PathBuf {
    let raw = RawNode::branch(
        None,
        vec![
            RawNode::branch(
                Some(0.9),
                vec![
                    RawNode::branch(
                        Some(0.5),
                        vec![RawNode::leaf(cells("a1x", 2)), RawNode::leaf(cells("a1y", 1))],
                    ),
                    RawNode::branch(
                        Some(0.5),
                        vec![RawNode::leaf(cells("a2x", 1)), RawNode::leaf(cells("a2y", 1))],
                    ),
                ],
            ),
            RawNode::branch(
                Some(0.8),
                vec![RawNode::leaf(cells("b1", 3)), RawNode::leaf(cells("b2", 1))],
            ),
        ],
    );
    let tree = dir.join("tree.json");
    fs::write(&tree, serde_json::to_string(&raw).unwrap()).unwrap();
    fs::write(
        dir.join("labels.csv"),
        "item,label\nb1-0,T cell\nb1-1,T cell\nb2-0,B cell\n",
    )
    .unwrap();
    fs::write(
        dir.join("features.json"),
        r#"{"CD4": {"a1x-0": 2.0, "a1x-1": 0.0, "b1-0": 5.0}, "CD8": {"b1-0": 1.0}}"#,
    )
    .unwrap();
    fs::write(dir.join("node_values.csv"), "node_id,score\n8,0.75\n").unwrap();
    tree
}

fn args(dir: &Path, tree: PathBuf, out: &str) -> RenderArgs {
    RenderArgs {
        tree,
        labels: Some(dir.join("labels.csv")),
        state: None,
        features: Some(dir.join("features.json")),
        active_features: vec!["CD4".to_string()],
        node_values: Some(dir.join("node_values.csv")),
        prune: vec![ValuePruner::MinSize(2.0)],
        width: Some(500.0),
        out_dir: dir.join(out),
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn render_writes_every_export() {
    let dir = TempDir::new().unwrap();
    let tree = write_inputs(dir.path());
    let out = dir.path().join("out");

    let written = render::render(&args(dir.path(), tree, "out"), &Config::default()).unwrap();
    assert_eq!(written.len(), 5);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let csv = fs::read_to_string(out.join(render::NODES_CSV)).unwrap();
    assert_eq!(csv.lines().count(), 8);
    assert_eq!(csv.lines().nth(1), Some("0,,9,6,"));

    let nodes = read_json(&out.join(render::NODES_JSON));
    let b = &nodes["children"][1];
    assert_eq!(b["id"], 8);
    // counts come from the unpruned subtree, b2 included
    assert_eq!(b["labelCount"]["T cell"]["quantity"], 2.0);
    assert_eq!(b["labelCount"]["Label Not Provided"]["quantity"], 1.0);
    assert_eq!(b["featureCount"]["CD4"]["quantity"], 5.0);
    assert_eq!(b["featureHiLos"]["high-CD4"]["quantity"], 1.0);
    assert_eq!(b["featureHiLos"]["low-CD4"]["quantity"], 3.0);
    assert_eq!(b["userAnnotation"]["quantity"], 0.75);
    assert_eq!(nodes["featureHiLos"]["high-CD4"]["quantity"], 2.0);

    let layout = read_json(&out.join(render::LAYOUT_JSON));
    assert_eq!(layout["width"], 500.0);
    assert_eq!(layout["nodes"].as_array().unwrap().len(), 7);

    let exported = RawNode::from_json_str(&fs::read_to_string(out.join(render::CLUSTER_TREE_JSON)).unwrap()).unwrap();
    let rebuilt = build_tree(&exported).unwrap();
    assert_eq!(rebuilt.value, 9);
    assert_eq!(rebuilt.node_count(), 7);

    let state = read_json(&out.join(render::STATE_JSON));
    assert_eq!(state["features"], serde_json::json!(["CD4"]));
    assert_eq!(state["pruneState"][0]["valuePruner"]["key"], "minSize");
    assert_eq!(state["pruneState"][1]["valuePruner"], serde_json::json!({}));
    assert_eq!(state["scales"]["branchsizeScaleRange"], serde_json::json!([0.01, 20.0]));
    let color = &state["scales"]["colorScale"];
    assert_eq!(color["variant"], "featureHiLos");
    assert_eq!(color["featureHiLoDomain"], serde_json::json!(["high-CD4", "low-CD4"]));
    assert_eq!(color["featureHiLoThresholds"]["CD4"], 2.0);
    assert_eq!(color["labelDomain"], serde_json::json!(["B cell", "T cell"]));
}

#[test]
fn saved_state_reproduces_the_view() {
    let dir = TempDir::new().unwrap();
    let tree = write_inputs(dir.path());
    render::render(&args(dir.path(), tree.clone(), "first"), &Config::default()).unwrap();

    let mut again = args(dir.path(), tree, "second");
    again.state = Some(dir.path().join("first").join(render::STATE_JSON));
    again.prune.clear();
    again.active_features.clear();
    again.width = None;
    render::render(&again, &Config::default()).unwrap();

    let first = fs::read_to_string(dir.path().join("first").join(render::NODES_CSV)).unwrap();
    let second = fs::read_to_string(dir.path().join("second").join(render::NODES_CSV)).unwrap();
    assert_eq!(first, second);

    let state = read_json(&dir.path().join("second").join(render::STATE_JSON));
    assert_eq!(state["features"], serde_json::json!(["CD4"]));
    assert_eq!(state["width"], 500.0);
}

#[test]
fn malformed_labels_abort_the_render() {
    let dir = TempDir::new().unwrap();
    let tree = write_inputs(dir.path());
    fs::write(dir.path().join("labels.csv"), "a,b,c\n1,2,3\n").unwrap();

    let result = render::render(&args(dir.path(), tree, "out"), &Config::default());
    assert!(result.is_err());
    assert!(!dir.path().join("out").join(render::STATE_JSON).exists());
}

#[test]
fn wrong_shaped_feature_file_aborts_the_render() {
    let dir = TempDir::new().unwrap();
    let tree = write_inputs(dir.path());
    fs::write(dir.path().join("features.json"), r#"{"CD4": [1, 2]}"#).unwrap();

    let err = render::render(&args(dir.path(), tree, "out"), &Config::default()).unwrap_err();
    assert!(err.to_string().contains("Invalid upload format"), "{}", err);
    assert!(!dir.path().join("out").join(render::STATE_JSON).exists());
    assert!(!dir.path().join("out").join(render::NODES_JSON).exists());
}

#[test]
fn saved_font_size_is_carried_forward() {
    let dir = TempDir::new().unwrap();
    let tree = write_inputs(dir.path());
    render::render(&args(dir.path(), tree.clone(), "first"), &Config::default()).unwrap();

    let saved_path = dir.path().join("first").join(render::STATE_JSON);
    let mut saved = read_json(&saved_path);
    saved["fontsize"] = serde_json::json!(16.0);
    fs::write(&saved_path, serde_json::to_string(&saved).unwrap()).unwrap();

    let mut again = args(dir.path(), tree, "second");
    again.state = Some(saved_path);
    render::render(&again, &Config::default()).unwrap();

    let state = read_json(&dir.path().join("second").join(render::STATE_JSON));
    assert_eq!(state["fontsize"], 16.0);
}

#[test]
fn stats_report_covers_the_pruned_tree() {
    let dir = TempDir::new().unwrap();
    let tree = write_inputs(dir.path());

    let report = stats::report(&tree, 4, &[]).unwrap();
    assert_eq!(report.metadata.node_count, 11);
    assert_eq!(report.metadata.leaf_count, 6);
    assert!(report.distributions.distance.is_some());

    let pruned = stats::report(&tree, 4, &[ValuePruner::MinSize(2.0)]).unwrap();
    assert_eq!(pruned.metadata.node_count, 7);
    assert_eq!(pruned.distributions.size.plain_groups[0].count, 7);
}
