//! Tree views: a selection tree together with the callbacks subscribed to it.
//!
//! Each view owns its own subscriptions. The binding layer calls
//! [`TreeView::toggle`] once per user interaction and reflects the returned
//! (and broadcast) [`ChangeSet`] into its visual layer.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{on_user_toggle, AncestorWalk, DomainError, NodeId, SelectionState, TreeArena};

/// Handle returned by [`TreeView::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// State change of a single node caused by one toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChange {
    pub node: NodeId,
    pub key: String,
    pub before: SelectionState,
    pub after: SelectionState,
}

/// Every node whose observable state changed during one toggle, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Key of the toggled node
    pub origin: String,
    pub checked: bool,
    pub changes: Vec<NodeChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, key: &str) -> Option<&NodeChange> {
        self.changes.iter().find(|c| c.key == key)
    }
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    Selection(ChangeSet),
    Visibility { node: NodeId, key: String, open: bool },
}

type Listener = Box<dyn FnMut(&TreeEvent)>;

pub struct TreeView {
    tree: TreeArena,
    walk: AncestorWalk,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for TreeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("nodes", &self.tree.len())
            .field("walk", &self.walk)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl TreeView {
    pub fn new(tree: TreeArena, walk: AncestorWalk) -> Self {
        Self {
            tree,
            walk,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    pub fn into_tree(self) -> TreeArena {
        self.tree
    }

    pub fn walk(&self) -> AncestorWalk {
        self.walk
    }

    /// Register a callback invoked after every non-empty change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&TreeEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn node_id(&self, key: &str) -> ApplicationResult<NodeId> {
        self.tree
            .find(key)
            .ok_or_else(|| DomainError::NodeNotFound(key.to_string()).into())
    }

    pub fn state(&self, key: &str) -> ApplicationResult<SelectionState> {
        let idx = self.node_id(key)?;
        self.tree
            .get_node(idx)
            .map(|n| n.state())
            .ok_or_else(|| DomainError::NodeNotFound(key.to_string()).into())
    }

    /// Apply a user toggle addressed by key.
    pub fn toggle(&mut self, key: &str, checked: bool) -> ApplicationResult<ChangeSet> {
        let idx = self.node_id(key)?;
        Ok(self.toggle_node(idx, checked))
    }

    /// Apply a user toggle of `node`, propagate it and notify subscribers.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_node(&mut self, node: NodeId, checked: bool) -> ChangeSet {
        let before: HashMap<NodeId, SelectionState> = self.tree.snapshot().into_iter().collect();

        on_user_toggle(&mut self.tree, node, checked, self.walk);

        let changes: Vec<NodeChange> = self
            .tree
            .iter()
            .filter_map(|(idx, n)| {
                let prior = *before.get(&idx)?;
                (prior != n.state()).then(|| NodeChange {
                    node: idx,
                    key: n.data.key.clone(),
                    before: prior,
                    after: n.state(),
                })
            })
            .collect();

        let change_set = ChangeSet {
            origin: self
                .tree
                .get_node(node)
                .map(|n| n.data.key.clone())
                .unwrap_or_default(),
            checked,
            changes,
        };
        debug!(changed = change_set.len(), "toggle");

        if !change_set.is_empty() {
            self.emit(&TreeEvent::Selection(change_set.clone()));
        }
        change_set
    }

    /// Flip a branch open or closed; returns the new `open` value.
    pub fn toggle_open(&mut self, key: &str) -> ApplicationResult<bool> {
        let idx = self.node_id(key)?;
        let open = self
            .tree
            .toggle_open(idx)
            .ok_or_else(|| DomainError::NodeNotFound(key.to_string()))?;
        self.emit(&TreeEvent::Visibility {
            node: idx,
            key: key.to_string(),
            open,
        });
        Ok(open)
    }

    pub fn expand_all(&mut self) {
        self.set_all_open(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all_open(false);
    }

    fn set_all_open(&mut self, open: bool) {
        let flipped: Vec<(NodeId, String)> = self
            .tree
            .iter()
            .filter(|(_, n)| !n.is_leaf() && n.open != open)
            .map(|(idx, n)| (idx, n.data.key.clone()))
            .collect();

        if open {
            self.tree.expand_all();
        } else {
            self.tree.collapse_all();
        }
        for (node, key) in flipped {
            self.emit(&TreeEvent::Visibility { node, key, open });
        }
    }

    fn emit(&mut self, event: &TreeEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::domain::NodeData;

    fn view() -> TreeView {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(NodeData::checkbox("root"), None);
        tree.insert_node(NodeData::checkbox("a"), Some(root));
        tree.insert_node(NodeData::checkbox("b"), Some(root));
        TreeView::new(tree, AncestorWalk::ToRoot)
    }

    #[test]
    fn test_toggle_reports_changes_in_display_order() {
        let mut view = view();
        let changes = view.toggle("root", true).unwrap();
        let keys: Vec<&str> = changes.changes.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["root", "a", "b"]);
        assert_eq!(changes.origin, "root");
        assert_eq!(
            changes.get("a").map(|c| (c.before, c.after)),
            Some((SelectionState::Unchecked, SelectionState::Checked))
        );
    }

    #[test]
    fn test_subscribers_receive_events_until_unsubscribed() {
        let mut view = view();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = view.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        view.toggle("a", true).unwrap();
        // same value again: nothing changes, nothing is emitted
        view.toggle("a", true).unwrap();
        assert_eq!(seen.borrow().len(), 1);

        assert!(view.unsubscribe(id));
        assert!(!view.unsubscribe(id));
        view.toggle("b", true).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(view.subscriber_count(), 0);
    }

    #[test]
    fn test_visibility_events() {
        let mut view = view();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        view.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        assert!(view.toggle_open("root").unwrap());
        view.expand_all();
        view.collapse_all();

        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], TreeEvent::Visibility { open: false, .. }));
    }

    #[test]
    fn test_unknown_key_is_reported() {
        let mut view = view();
        assert!(view.toggle("nope", true).is_err());
        assert!(view.state("nope").is_err());
    }
}
