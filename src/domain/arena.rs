//! Arena-backed selection tree.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{NodeData, SelectionState, TreeStats};

/// Identity of a node, stable for the node's lifetime.
pub type NodeId = Index;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Key, label and input kind of this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for root-level nodes
    pub parent: Option<NodeId>,
    /// Indices of child nodes in the arena, in display order
    pub children: Vec<NodeId>,
    pub checked: bool,
    /// Derived from the children, never set by a user action
    pub indeterminate: bool,
    /// Branch visibility, unrelated to selection
    pub open: bool,
}

impl TreeNode {
    fn new(data: NodeData, parent: Option<NodeId>) -> Self {
        Self {
            data,
            parent,
            children: Vec::new(),
            checked: false,
            indeterminate: false,
            open: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.data.key
    }

    pub fn state(&self) -> SelectionState {
        SelectionState::from_flags(self.checked, self.indeterminate)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_radio(&self) -> bool {
        self.data.input.is_radio()
    }

    /// Explicit checked-state write; always clears `indeterminate`.
    pub(crate) fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
        self.indeterminate = false;
    }

    /// Mark the node as having disagreeing children. Radios stay determinate.
    pub(crate) fn mark_indeterminate(&mut self) {
        if !self.is_radio() {
            self.indeterminate = true;
        }
    }
}

/// Arena-based selection tree.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// A tree may have several root-level nodes. Radio groups are indexed at
/// insertion time so group lookups never scan the whole arena.
#[derive(Debug, Clone, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<NodeId>,
    keys: HashMap<String, NodeId>,
    groups: HashMap<String, Vec<NodeId>>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let key = data.key.clone();
        let group = data.input.group().map(str::to_string);
        let node_idx = self.arena.insert(TreeNode::new(data, parent));

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }
        if let Some(group) = group {
            self.groups.entry(group).or_default().push(node_idx);
        }
        self.keys.insert(key, node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    /// Look up a node by its definition key.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Direct children of `node`, in display order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get_node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// The input owning the branch `node` sits in; None at root level.
    pub fn parent_input(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node).and_then(|n| n.parent)
    }

    /// Every node sharing the immediate parent context of `node`, `node` included.
    pub fn siblings_at_level(&self, node: NodeId) -> Vec<NodeId> {
        match self.parent_input(node) {
            Some(parent) => self.children(parent).to_vec(),
            None => self.roots.clone(),
        }
    }

    /// Every radio of `group` anywhere in the tree, except `excluding`.
    pub fn all_in_group(&self, group: &str, excluding: NodeId) -> Vec<NodeId> {
        self.groups
            .get(group)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|&idx| idx != excluding)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Radio group names, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_input(node);
        while let Some(idx) = current {
            ancestors.push(idx);
            current = self.parent_input(idx);
        }
        ancestors
    }

    /// Number of ancestors of `node` (0 for root-level nodes).
    pub fn level(&self, node: NodeId) -> usize {
        self.ancestors(node).len()
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Nodes the binding layer should show: those whose ancestors are all open.
    pub fn visible(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(idx, _)| {
                self.ancestors(*idx)
                    .iter()
                    .all(|&a| self.get_node(a).is_some_and(|n| n.open))
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Keys of all leaf nodes, in display order.
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.data.key.clone())
            .collect()
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes: self.len(),
            roots: self.roots.len(),
            leaves: self.leaf_nodes().len(),
            depth: self.depth(),
            groups: self.group_names(),
        }
    }

    /// A branch gets an open/close handle when it has children.
    pub fn has_handle(&self, node: NodeId) -> bool {
        !self.children(node).is_empty()
    }

    /// Flip the visibility of a branch; returns the new `open` value.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_open(&mut self, node: NodeId) -> Option<bool> {
        let node = self.get_node_mut(node)?;
        node.open = !node.open;
        Some(node.open)
    }

    /// Returns false when `node` is not in the tree.
    pub fn set_open(&mut self, node: NodeId, open: bool) -> bool {
        match self.get_node_mut(node) {
            Some(n) => {
                n.open = open;
                true
            }
            None => false,
        }
    }

    pub fn expand_all(&mut self) {
        self.set_all_open(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all_open(false);
    }

    fn set_all_open(&mut self, open: bool) {
        for (_, node) in self.arena.iter_mut() {
            if !node.children.is_empty() {
                node.open = open;
            }
        }
    }

    /// Checked/indeterminate flags of every node, in arena order.
    pub(crate) fn snapshot(&self) -> Vec<(NodeId, SelectionState)> {
        self.arena
            .iter()
            .map(|(idx, node)| (idx, node.state()))
            .collect()
    }

    /// Every radio of `group`, in insertion order.
    pub fn group_members(&self, group: &str) -> &[NodeId] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Pre-order, left-to-right traversal over all root-level subtrees.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots().iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Post-order traversal: every child is yielded before its parent.
pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots().iter().rev().map(|&r| (r, false)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
