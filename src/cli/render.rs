//! Plain-text preview of selection trees
//!
//! Branch handles follow the usual tree-view convention: `>` closed,
//! `v` open. Closed branches hide their children unless
//! `display.show_collapsed` is set.

use termtree::Tree;

use crate::config::DisplaySettings;
use crate::domain::{NodeId, SelectionState, TreeArena, TreeNode};

pub trait TreeRender {
    /// One termtree per root-level node.
    fn to_tree_strings(&self, display: &DisplaySettings) -> Vec<Tree<String>>;

    fn render(&self, display: &DisplaySettings) -> String {
        self.to_tree_strings(display)
            .iter()
            .map(|tree| tree.to_string())
            .collect()
    }
}

impl TreeRender for TreeArena {
    fn to_tree_strings(&self, display: &DisplaySettings) -> Vec<Tree<String>> {
        fn build_tree(arena: &TreeArena, node_idx: NodeId, display: &DisplaySettings) -> Option<Tree<String>> {
            let node = arena.get_node(node_idx)?;
            let mut tree = Tree::new(node_line(node, display));
            if node.open || display.show_collapsed {
                for &child_idx in &node.children {
                    if let Some(child) = build_tree(arena, child_idx, display) {
                        tree.push(child);
                    }
                }
            }
            Some(tree)
        }

        self.roots()
            .iter()
            .filter_map(|&root| build_tree(self, root, display))
            .collect()
    }
}

/// Input marker: `[x] [ ] [-]` for checkboxes, `(*) ( )` for radios.
pub fn marker(node: &TreeNode) -> &'static str {
    match (node.is_radio(), node.state()) {
        (false, SelectionState::Checked) => "[x]",
        (false, SelectionState::Unchecked) => "[ ]",
        (false, SelectionState::Indeterminate) => "[-]",
        (true, SelectionState::Checked) => "(*)",
        (true, _) => "( )",
    }
}

pub fn node_line(node: &TreeNode, display: &DisplaySettings) -> String {
    let handle = match (node.is_leaf(), node.open) {
        (true, _) => "",
        (false, true) => "v ",
        (false, false) => "> ",
    };
    let mut line = format!("{}{} {}", handle, marker(node), node.data.label);
    if display.show_keys && node.data.key != node.data.label {
        line.push_str(&format!(" [{}]", node.data.key));
    }
    if let Some(group) = node.data.input.group() {
        line.push_str(&format!(" <{}>", group));
    }
    line
}
