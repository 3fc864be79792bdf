//! Selection state propagation.
//!
//! A single user toggle is applied in order: the local write, the downward
//! cascade into the subtree, radio group exclusivity across the whole tree,
//! and finally the upward recomputation of every ancestor. The whole
//! sequence runs synchronously; nothing outside observes intermediate states.
//!
//! Functions here trust their input. Indices that are not in the arena are
//! skipped, structural validation happens in [`crate::domain::TreeBuilder`].

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::entities::InputKind;

/// How far [`recompute_ancestors`] walks up from the changed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AncestorWalk {
    /// Re-evaluate every ancestor up to the root level
    #[default]
    ToRoot,
    /// Re-evaluate the immediate parent only
    SingleLevel,
}

impl FromStr for AncestorWalk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "to-root" | "root" => Ok(AncestorWalk::ToRoot),
            "single-level" | "single" => Ok(AncestorWalk::SingleLevel),
            other => Err(format!(
                "unknown ancestor walk '{}', expected 'to-root' or 'single-level'",
                other
            )),
        }
    }
}

impl fmt::Display for AncestorWalk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AncestorWalk::ToRoot => write!(f, "to-root"),
            AncestorWalk::SingleLevel => write!(f, "single-level"),
        }
    }
}

/// Apply a user toggle of `node` to `checked` and propagate it.
///
/// Radios reset by group exclusivity get their ancestors recomputed before
/// the toggled node does, so the toggled node's walk sees final sibling
/// states on every shared ancestor.
#[instrument(level = "debug", skip(tree))]
pub fn on_user_toggle(tree: &mut TreeArena, node: NodeId, checked: bool, walk: AncestorWalk) {
    match tree.get_node_mut(node) {
        Some(target) => target.set_checked(checked),
        None => {
            warn!("toggle on a node outside the tree ignored");
            return;
        }
    }

    cascade_down(tree, node, checked);

    let reset = exclusive_group_reset(tree, node);
    for &other in &reset {
        recompute_ancestors(tree, other, walk);
    }

    let steps = recompute_ancestors(tree, node, walk);
    debug!(reset = reset.len(), steps, "toggle applied");
}

/// Give every descendant of `node` the value `checked`, clearing indeterminate.
///
/// A no-op on leaves.
#[instrument(level = "trace", skip(tree))]
pub fn cascade_down(tree: &mut TreeArena, node: NodeId, checked: bool) {
    let children = tree.children(node).to_vec();
    if children.is_empty() {
        return;
    }

    for &child in &children {
        if let Some(child) = tree.get_node_mut(child) {
            child.set_checked(checked);
        }
    }
    for child in children {
        cascade_down(tree, child, checked);
    }
}

/// Uncheck every other radio of `node`'s group, together with their subtrees.
///
/// Only acts when `node` is a checked radio. Group scope is the whole tree,
/// so members in unrelated branches are reset as well. Returns the members
/// that were reset.
#[instrument(level = "trace", skip(tree))]
pub fn exclusive_group_reset(tree: &mut TreeArena, node: NodeId) -> Vec<NodeId> {
    let group = match tree.get_node(node) {
        Some(n) if n.checked => match &n.data.input {
            InputKind::Radio { group } => group.clone(),
            InputKind::Checkbox => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let others = tree.all_in_group(&group, node);
    for &other in &others {
        if let Some(member) = tree.get_node_mut(other) {
            trace!(key = %member.data.key, %group, "radio reset");
            member.set_checked(false);
        }
        cascade_down(tree, other, false);
    }
    others
}

/// Re-derive the state of `node`'s ancestors from their children.
///
/// At each level the parent becomes indeterminate when a sibling disagrees
/// with the current node or is itself indeterminate; otherwise it takes the
/// current node's value. Returns the number of ancestors evaluated, which
/// for [`AncestorWalk::ToRoot`] equals the node's level.
#[instrument(level = "trace", skip(tree))]
pub fn recompute_ancestors(tree: &mut TreeArena, node: NodeId, walk: AncestorWalk) -> usize {
    let mut current = node;
    let mut steps = 0;

    while let Some(parent) = tree.parent_input(current) {
        let Some(checked) = tree.get_node(current).map(|n| n.checked) else {
            break;
        };
        let mixed = tree
            .siblings_at_level(current)
            .into_iter()
            .filter_map(|s| tree.get_node(s))
            .any(|s| s.checked != checked || s.indeterminate);

        if let Some(parent_node) = tree.get_node_mut(parent) {
            if mixed {
                parent_node.mark_indeterminate();
            } else {
                parent_node.set_checked(checked);
            }
        }
        steps += 1;

        if walk == AncestorWalk::SingleLevel {
            break;
        }
        current = parent;
    }
    steps
}

/// Re-derive every branch in the tree from its children, bottom-up.
///
/// Used after construction, when checked flags come from a definition and
/// branches may contradict their children. Leaves only lose a stale
/// indeterminate flag.
#[instrument(level = "debug", skip(tree))]
pub fn reconcile(tree: &mut TreeArena) {
    let order: Vec<NodeId> = tree.iter_postorder().map(|(idx, _)| idx).collect();

    for idx in order {
        let children = tree.children(idx).to_vec();
        if children.is_empty() {
            if let Some(leaf) = tree.get_node_mut(idx) {
                leaf.indeterminate = false;
            }
            continue;
        }

        let states: Vec<(bool, bool)> = children
            .iter()
            .filter_map(|&c| tree.get_node(c))
            .map(|c| (c.checked, c.indeterminate))
            .collect();
        let uniform = states.iter().map(|(checked, _)| checked).all_equal()
            && !states.iter().any(|(_, indeterminate)| *indeterminate);
        let common = states.first().map(|(checked, _)| *checked);

        if let Some(branch) = tree.get_node_mut(idx) {
            match (uniform, common) {
                (true, Some(checked)) => branch.set_checked(checked),
                _ => branch.mark_indeterminate(),
            }
        }
    }
}
