//! Propagation engine behavior on trees loaded from definition files.

use std::path::Path;
use std::sync::Arc;

use rstest::{fixture, rstest};

use tritree::application::services::TreeFileService;
use tritree::config::EngineSettings;
use tritree::domain::{
    on_user_toggle, recompute_ancestors, AncestorWalk, NodeDefinition, NodeId, SelectionState,
    TreeArena, TreeBuilder, TreeDefinition, TreeNode,
};
use tritree::infrastructure::traits::RealFileSystem;
use tritree::util::testing;

fn load(path: &str) -> TreeArena {
    testing::init_test_setup();
    TreeFileService::new(Arc::new(RealFileSystem), EngineSettings::default())
        .load_tree(Path::new(path))
        .expect("load tree")
}

#[fixture]
fn catalog() -> TreeArena {
    load("tests/resources/trees/catalog.toml")
}

fn id(tree: &TreeArena, key: &str) -> NodeId {
    tree.find(key).unwrap_or_else(|| panic!("no node '{}'", key))
}

fn state(tree: &TreeArena, key: &str) -> SelectionState {
    tree.get_node(id(tree, key)).unwrap().state()
}

fn toggle(tree: &mut TreeArena, key: &str, checked: bool) {
    let node = id(tree, key);
    on_user_toggle(tree, node, checked, AncestorWalk::ToRoot);
}

fn descendants(tree: &TreeArena, node: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = tree.children(node).to_vec();
    while let Some(idx) = stack.pop() {
        found.push(idx);
        stack.extend_from_slice(tree.children(idx));
    }
    found
}

/// Every checkbox branch agrees with its direct children; radios are never indeterminate.
fn assert_consistent(tree: &TreeArena) {
    for (idx, node) in tree.iter() {
        if node.is_radio() {
            assert!(!node.indeterminate, "radio '{}' is indeterminate", node.key());
            continue;
        }
        if node.is_leaf() {
            continue;
        }
        let children: Vec<&TreeNode> = tree
            .children(idx)
            .iter()
            .filter_map(|&c| tree.get_node(c))
            .collect();
        let first = children[0].checked;
        let mixed = children
            .iter()
            .any(|c| c.indeterminate || c.checked != first);
        assert_eq!(node.indeterminate, mixed, "indeterminate flag of '{}'", node.key());
        if !mixed {
            assert_eq!(node.checked, first, "checked flag of '{}'", node.key());
        }
    }
}

fn states(tree: &TreeArena) -> Vec<(String, SelectionState)> {
    tree.iter()
        .map(|(_, n)| (n.key().to_string(), n.state()))
        .collect()
}

// ============================================================
// Downward cascade
// ============================================================

#[rstest]
fn given_branch_when_toggled_then_whole_subtree_follows(mut catalog: TreeArena) {
    let root = id(&catalog, "root");

    toggle(&mut catalog, "root", true);
    for idx in descendants(&catalog, root) {
        let node = catalog.get_node(idx).unwrap();
        assert_eq!(node.state(), SelectionState::Checked, "descendant '{}'", node.key());
    }
    // a radio outside the subtree keeps its state
    assert_eq!(state(&catalog, "z"), SelectionState::Unchecked);

    toggle(&mut catalog, "root", false);
    for idx in descendants(&catalog, root) {
        let node = catalog.get_node(idx).unwrap();
        assert_eq!(node.state(), SelectionState::Unchecked, "descendant '{}'", node.key());
    }
}

#[rstest]
fn given_partial_subtree_when_parent_toggled_then_indeterminate_is_cleared(mut catalog: TreeArena) {
    toggle(&mut catalog, "a1", true);
    assert_eq!(state(&catalog, "a"), SelectionState::Indeterminate);

    toggle(&mut catalog, "a", false);

    assert_eq!(state(&catalog, "a"), SelectionState::Unchecked);
    assert_eq!(state(&catalog, "a1"), SelectionState::Unchecked);
    assert_eq!(state(&catalog, "root"), SelectionState::Unchecked);
}

// ============================================================
// Upward recomputation
// ============================================================

#[test]
fn given_single_branch_when_branch_checked_then_children_and_root_are_checked() {
    testing::init_test_setup();
    let definition = TreeDefinition::new(vec![
        NodeDefinition::new("Root"),
        NodeDefinition::new("A").parent("Root"),
        NodeDefinition::new("A1").parent("A"),
        NodeDefinition::new("A2").parent("A"),
    ]);
    let mut tree = TreeBuilder::new().build(&definition).unwrap();

    toggle(&mut tree, "A", true);

    assert_eq!(state(&tree, "A1"), SelectionState::Checked);
    assert_eq!(state(&tree, "A2"), SelectionState::Checked);
    assert_eq!(state(&tree, "A"), SelectionState::Checked);
    assert_eq!(state(&tree, "Root"), SelectionState::Checked);
}

#[rstest]
fn given_mixed_leaves_when_last_leaf_checked_then_ancestors_settle(mut catalog: TreeArena) {
    toggle(&mut catalog, "a1", true);
    assert_eq!(state(&catalog, "a"), SelectionState::Indeterminate);
    assert_eq!(state(&catalog, "root"), SelectionState::Indeterminate);

    toggle(&mut catalog, "a2", true);
    assert_eq!(state(&catalog, "a"), SelectionState::Checked);
    // b is still unchecked
    assert_eq!(state(&catalog, "root"), SelectionState::Indeterminate);
}

#[rstest]
fn given_indeterminate_sibling_when_recomputing_then_parent_stays_indeterminate(
    mut catalog: TreeArena,
) {
    // a becomes indeterminate, b is checked: root is mixed through a
    toggle(&mut catalog, "a1", true);
    toggle(&mut catalog, "b", true);

    assert_eq!(state(&catalog, "root"), SelectionState::Indeterminate);
    assert_consistent(&catalog);
}

#[test]
fn given_radio_branch_when_children_disagree_then_radio_is_never_indeterminate() {
    testing::init_test_setup();
    let definition = TreeDefinition::new(vec![
        NodeDefinition::new("top"),
        NodeDefinition::new("r").parent("top").radio("g"),
        NodeDefinition::new("c1").parent("r"),
        NodeDefinition::new("c2").parent("r"),
    ]);
    let mut tree = TreeBuilder::new().build(&definition).unwrap();

    toggle(&mut tree, "c1", true);

    assert_eq!(state(&tree, "r"), SelectionState::Unchecked);
    assert!(!tree.get_node(id(&tree, "r")).unwrap().indeterminate);
    // the walk continues past the radio
    assert_eq!(state(&tree, "top"), SelectionState::Unchecked);
}

#[test]
fn given_single_level_walk_when_leaf_toggled_then_only_parent_is_updated() {
    testing::init_test_setup();
    let definition = TreeDefinition::new(vec![
        NodeDefinition::new("top"),
        NodeDefinition::new("mid").parent("top"),
        NodeDefinition::new("leaf").parent("mid"),
    ]);
    let mut tree = TreeBuilder::new().build(&definition).unwrap();
    let leaf = id(&tree, "leaf");

    on_user_toggle(&mut tree, leaf, true, AncestorWalk::SingleLevel);

    assert_eq!(state(&tree, "mid"), SelectionState::Checked);
    assert_eq!(state(&tree, "top"), SelectionState::Unchecked);

    on_user_toggle(&mut tree, leaf, true, AncestorWalk::ToRoot);
    assert_eq!(state(&tree, "top"), SelectionState::Checked);
}

#[rstest]
fn given_any_node_when_walking_to_root_then_steps_equal_its_level(mut catalog: TreeArena) {
    let nodes: Vec<NodeId> = catalog.iter().map(|(idx, _)| idx).collect();
    for idx in nodes {
        let level = catalog.level(idx);
        let steps = recompute_ancestors(&mut catalog, idx, AncestorWalk::ToRoot);
        assert_eq!(steps, level);
    }
    assert_eq!(catalog.level(id(&catalog, "x1")), 3);
}

// ============================================================
// Radio group exclusivity
// ============================================================

#[rstest]
fn given_group_spanning_branches_when_radio_checked_then_other_members_are_reset(
    mut catalog: TreeArena,
) {
    toggle(&mut catalog, "x", true);
    assert_eq!(state(&catalog, "x1"), SelectionState::Checked);
    assert_eq!(state(&catalog, "b"), SelectionState::Indeterminate);
    assert_eq!(state(&catalog, "root"), SelectionState::Indeterminate);

    // z sits in a different root-level subtree
    toggle(&mut catalog, "z", true);

    assert_eq!(state(&catalog, "z"), SelectionState::Checked);
    assert_eq!(state(&catalog, "z1"), SelectionState::Checked);
    for key in ["x", "x1", "y", "y1"] {
        assert_eq!(state(&catalog, key), SelectionState::Unchecked, "{}", key);
    }
    // ancestors of the reset radio are recomputed as well
    assert_eq!(state(&catalog, "b"), SelectionState::Unchecked);
    assert_eq!(state(&catalog, "root"), SelectionState::Unchecked);
}

#[test]
fn given_root_level_radio_when_checked_then_nested_members_and_children_are_reset() {
    let mut tree = load("tests/resources/trees/groups.toml");
    assert_eq!(state(&tree, "Y"), SelectionState::Checked);
    assert_eq!(state(&tree, "p"), SelectionState::Checked);

    toggle(&mut tree, "X", true);

    assert_eq!(state(&tree, "X"), SelectionState::Checked);
    for key in ["Y", "Y1", "Z", "Z1", "p", "q"] {
        assert_eq!(state(&tree, key), SelectionState::Unchecked, "{}", key);
    }
}

#[rstest]
fn given_radio_when_unchecked_then_group_is_left_alone(mut catalog: TreeArena) {
    toggle(&mut catalog, "x", true);
    toggle(&mut catalog, "x", false);

    assert_eq!(state(&catalog, "x"), SelectionState::Unchecked);
    assert_eq!(state(&catalog, "y"), SelectionState::Unchecked);
    assert_eq!(state(&catalog, "z"), SelectionState::Unchecked);
    assert_eq!(state(&catalog, "b"), SelectionState::Unchecked);
}

// ============================================================
// Whole-tree properties
// ============================================================

#[rstest]
#[case::leaves(&[("a1", true), ("a2", true), ("x1", true), ("y1", true)])]
#[case::radios(&[("x", true), ("y", true), ("z", true), ("y", true)])]
#[case::branches(&[("root", true), ("a1", false), ("b", false), ("z", true)])]
#[case::mixed(&[("x1", true), ("a", true), ("z", true), ("x", true), ("a2", false), ("root", false)])]
fn given_toggle_sequence_when_applied_then_tree_stays_consistent(
    mut catalog: TreeArena,
    #[case] toggles: &[(&str, bool)],
) {
    for &(key, checked) in toggles {
        toggle(&mut catalog, key, checked);
        assert_consistent(&catalog);
    }
}

#[rstest]
#[case("a1", true)]
#[case("a", true)]
#[case("x", true)]
#[case("z", true)]
#[case("root", false)]
fn given_applied_toggle_when_repeated_then_nothing_changes(
    mut catalog: TreeArena,
    #[case] key: &str,
    #[case] checked: bool,
) {
    toggle(&mut catalog, "x1", true);
    toggle(&mut catalog, key, checked);
    let after_first = states(&catalog);

    toggle(&mut catalog, key, checked);

    assert_eq!(states(&catalog), after_first);
}
