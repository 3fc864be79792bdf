//! Tree builder: validates a declarative definition and builds the arena.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::entities::{
    InputKind, KindTag, NodeData, NodeDefinition, TreeDefinition,
};
use crate::domain::error::DomainError;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Deepest tree accepted unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Constructs selection trees from definitions.
///
/// Every precondition the propagation engine relies on is checked here:
/// unique keys, resolvable parents, no cycles, well-formed radio groups and
/// bounded depth.
pub struct TreeBuilder {
    max_depth: usize,
    relationship_cache: HashMap<String, Vec<String>>,
    visited_keys: HashSet<String>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            relationship_cache: HashMap::new(),
            visited_keys: HashSet::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build a tree from a definition.
    #[instrument(level = "debug", skip(self, definition), fields(nodes = definition.nodes.len()))]
    pub fn build(&mut self, definition: &TreeDefinition) -> TreeResult<TreeArena> {
        // Reset state for a fresh build
        self.relationship_cache.clear();
        self.visited_keys.clear();

        let by_key = self.index_definitions(definition)?;
        self.check_groups(definition)?;

        let roots: Vec<&str> = definition
            .nodes
            .iter()
            .filter(|d| d.parent.is_none())
            .map(|d| d.key.as_str())
            .collect();

        let mut tree = TreeArena::new();
        let mut stack: Vec<(&str, Option<NodeId>, usize)> =
            roots.iter().rev().map(|&key| (key, None, 1)).collect();

        while let Some((key, parent_idx, depth)) = stack.pop() {
            if !self.visited_keys.insert(key.to_string()) {
                return Err(DomainError::CycleDetected(key.to_string()));
            }
            if depth > self.max_depth {
                return Err(DomainError::DepthExceeded {
                    key: key.to_string(),
                    max: self.max_depth,
                });
            }

            let def = by_key[key];
            let current_idx = tree.insert_node(node_data(def)?, parent_idx);
            if let Some(node) = tree.get_node_mut(current_idx) {
                node.checked = def.checked;
                node.open = def.open;
            }

            // Children are pushed reversed so they are inserted in declaration order
            if let Some(children) = self.relationship_cache.get(key) {
                for child in children.iter().rev() {
                    stack.push((child.as_str(), Some(current_idx), depth + 1));
                }
            }
        }

        // Nodes unreachable from any root can only sit on a parent cycle
        if let Some(orphan) = definition
            .nodes
            .iter()
            .find(|d| !self.visited_keys.contains(&d.key))
        {
            return Err(DomainError::CycleDetected(orphan.key.clone()));
        }

        check_nesting(&tree)?;

        debug!(nodes = tree.len(), depth = tree.depth(), "tree built");
        Ok(tree)
    }

    fn index_definitions<'a>(
        &mut self,
        definition: &'a TreeDefinition,
    ) -> TreeResult<HashMap<&'a str, &'a NodeDefinition>> {
        let mut by_key = HashMap::new();
        for def in &definition.nodes {
            if def.key.trim().is_empty() {
                return Err(DomainError::InvalidNode {
                    message: "node key must not be empty".to_string(),
                });
            }
            if by_key.insert(def.key.as_str(), def).is_some() {
                return Err(DomainError::DuplicateKey(def.key.clone()));
            }
        }

        for def in &definition.nodes {
            if let Some(parent) = &def.parent {
                if !by_key.contains_key(parent.as_str()) {
                    return Err(DomainError::UnknownParent {
                        key: def.key.clone(),
                        parent: parent.clone(),
                    });
                }
                self.relationship_cache
                    .entry(parent.clone())
                    .or_default()
                    .push(def.key.clone());
            }
        }
        Ok(by_key)
    }

    /// At most one radio per group may start out checked.
    fn check_groups(&self, definition: &TreeDefinition) -> TreeResult<()> {
        let mut checked: HashMap<&str, Vec<String>> = HashMap::new();
        for def in &definition.nodes {
            let group = def.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
            // blank groups are reported as MissingGroup when the node is built
            if let (KindTag::Radio, Some(group), true) = (def.kind, group, def.checked) {
                checked.entry(group).or_default().push(def.key.clone());
            }
        }

        let mut conflicts: Vec<(&str, Vec<String>)> =
            checked.into_iter().filter(|(_, keys)| keys.len() > 1).collect();
        conflicts.sort();
        match conflicts.into_iter().next() {
            Some((group, keys)) => Err(DomainError::GroupConflict {
                group: group.to_string(),
                keys,
            }),
            None => Ok(()),
        }
    }
}

/// At most one radio per group may be checked in `tree`.
///
/// The builder checks the definition flags; this re-checks a built tree whose
/// branch states were derived afterwards, since [`crate::domain::reconcile`]
/// can check a radio from its children without resetting its group.
pub fn check_exclusive_groups(tree: &TreeArena) -> TreeResult<()> {
    for group in tree.group_names() {
        let keys: Vec<String> = tree
            .group_members(&group)
            .iter()
            .filter_map(|&idx| tree.get_node(idx))
            .filter(|n| n.checked)
            .map(|n| n.data.key.clone())
            .collect();
        if keys.len() > 1 {
            return Err(DomainError::GroupConflict { group, keys });
        }
    }
    Ok(())
}

/// A radio may not sit inside the subtree of another member of its group:
/// cascading into it and resetting it would contradict each other.
fn check_nesting(tree: &TreeArena) -> TreeResult<()> {
    for group in tree.group_names() {
        let members = tree.group_members(&group);
        for &member in members {
            let Some(outer) = tree
                .ancestors(member)
                .into_iter()
                .find(|a| members.contains(a))
            else {
                continue;
            };
            let key_of = |idx| {
                tree.get_node(idx)
                    .map(|n| n.data.key.clone())
                    .unwrap_or_default()
            };
            return Err(DomainError::NestedGroupMember {
                key: key_of(member),
                ancestor: key_of(outer),
                group,
            });
        }
    }
    Ok(())
}

fn node_data(def: &NodeDefinition) -> TreeResult<NodeData> {
    let group = def.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
    let input = match (def.kind, group) {
        (KindTag::Checkbox, None) => InputKind::Checkbox,
        (KindTag::Checkbox, Some(_)) => return Err(DomainError::UnexpectedGroup(def.key.clone())),
        (KindTag::Radio, Some(group)) => InputKind::Radio {
            group: group.to_string(),
        },
        (KindTag::Radio, None) => return Err(DomainError::MissingGroup(def.key.clone())),
    };

    Ok(NodeData {
        key: def.key.clone(),
        label: def.label.clone().unwrap_or_else(|| def.key.clone()),
        input,
    })
}
