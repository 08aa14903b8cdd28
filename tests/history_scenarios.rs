use cluster_tree_tools::export::StateExport;
use cluster_tree_tools::tree::{build_tree, CellItem, NodeId, RawNode, TreeNode};
use cluster_tree_tools::{ClickPruner, PruneSession, TreeError, ValuePruner};

fn cells(prefix: &str, count: usize) -> Vec<CellItem> {
    (0..count)
        .map(|i| CellItem::new(format!("{}-{}", prefix, i), i as u64))
        .collect()
}

// 0 root
// 1 A (0.9): 2 A1 (0.5) [3 a1x:2, 4 a1y:1], 5 A2 (0.5) [6 a2x:1, 7 a2y:1]
// 8 B (0.8): 9 b1:3, 10 b2:1
fn tree() -> TreeNode {
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
    build_tree(&raw).unwrap()
}

fn visible_ids(session: &PruneSession) -> Vec<u32> {
    session.visible().descendants().iter().map(|n| n.id.0).collect()
}

#[test]
fn apply_after_revert_truncates_history() {
    let mut session = PruneSession::new(tree());
    session.set_value_pruner(ValuePruner::MinSize(2.0)).unwrap();
    session.apply();
    session.set_value_pruner(ValuePruner::MinDepth(2.0)).unwrap();
    session.apply();
    session.add_click_prune(ClickPruner::SetCollapsedNode(NodeId(8))).unwrap();
    session.apply();
    assert_eq!(session.history().len(), 4);

    session.revert_to_step(1).unwrap();
    assert_eq!(session.history().len(), 4);
    // minSize=2 then a depth cap of 2 cuts a1x
    assert_eq!(visible_ids(&session), vec![0, 1, 2, 5, 8, 9]);

    session.apply();
    assert_eq!(session.history().len(), 3);
    assert_eq!(session.history().active_step_index(), 2);
    assert!(session.history().active_step().is_empty());
    assert_eq!(visible_ids(&session), vec![0, 1, 2, 5, 8, 9]);
}

#[test]
fn stale_clicks_are_skipped_on_replay() {
    let mut session = PruneSession::new(tree());
    session.add_click_prune(ClickPruner::SetRootNode(NodeId(1))).unwrap();
    // B is outside the new root, so this click has nothing to act on
    session.add_click_prune(ClickPruner::SetCollapsedNode(NodeId(8))).unwrap();
    session.add_click_prune(ClickPruner::SetCollapsedNode(NodeId(5))).unwrap();
    assert_eq!(visible_ids(&session), vec![1, 2, 3, 4, 5]);

    session.apply();
    session.revert_to_step(0).unwrap();
    assert_eq!(visible_ids(&session), vec![1, 2, 3, 4, 5]);
    assert_eq!(session.visible().depth, 0);
    assert_eq!(session.history().active_step().click_prune_history.len(), 3);
}

#[test]
fn removing_a_click_replays_the_step() {
    let mut session = PruneSession::new(tree());
    session.set_value_pruner(ValuePruner::MinSize(2.0)).unwrap();
    session.add_click_prune(ClickPruner::SetCollapsedNode(NodeId(1))).unwrap();
    assert_eq!(visible_ids(&session), vec![0, 1, 8, 9]);

    assert!(session.remove_click_prune(ClickPruner::SetCollapsedNode(NodeId(1))).unwrap());
    assert_eq!(visible_ids(&session), vec![0, 1, 2, 3, 5, 8, 9]);
    assert!(!session.remove_click_prune(ClickPruner::SetRootNode(NodeId(1))).unwrap());
}

#[test]
fn distributions_follow_the_active_baseline() {
    let mut session = PruneSession::new(tree());
    let full = session.distributions(4).unwrap();
    session.set_value_pruner(ValuePruner::MinSize(3.0)).unwrap();
    // threshold edits on the active step do not move the baseline
    assert_eq!(session.distributions(4).unwrap(), full);

    session.apply();
    let pruned = session.distributions(4).unwrap();
    assert_ne!(pruned, full);
    assert_eq!(pruned.size.plain_groups[0].count, session.visible().node_count());
}

#[test]
fn reverting_out_of_range_is_rejected() {
    let mut session = PruneSession::new(tree());
    assert!(matches!(
        session.revert_to_step(2),
        Err(TreeError::StepOutOfRange { index: 2, len: 1 })
    ));
    assert!(matches!(
        session.add_click_prune(ClickPruner::SetCollapsedNode(NodeId(99))),
        Ok(())
    ));
    assert_eq!(session.visible().node_count(), 11);
}

#[test]
fn saved_state_restores_value_prunes() {
    let mut session = PruneSession::new(tree());
    session.set_value_pruner(ValuePruner::MinSize(2.0)).unwrap();
    session.add_click_prune(ClickPruner::SetCollapsedNode(NodeId(2))).unwrap();
    session.apply();

    let saved = StateExport::capture(session.history(), vec![], Default::default(), 800.0);
    let json = serde_json::to_string(&saved).unwrap();
    let loaded: StateExport = serde_json::from_str(&json).unwrap();

    let restored = PruneSession::with_history(tree(), loaded.to_history());
    assert_eq!(restored.history().len(), 2);
    // clicks are not saved, so A1 keeps its child
    assert_eq!(visible_ids(&restored), vec![0, 1, 2, 3, 5, 8, 9]);
    assert_eq!(loaded.width, Some(800.0));
}
