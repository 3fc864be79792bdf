//! Tri-state selection trees.
//!
//! A tree of checkbox and radio inputs whose parent and child states are
//! kept consistent: toggling a node cascades into its subtree, resets the
//! other members of its radio group anywhere in the tree, and re-derives
//! every ancestor as checked, unchecked or indeterminate.
//!
//! ```
//! use tritree::domain::{on_user_toggle, AncestorWalk, NodeData, SelectionState, TreeArena};
//!
//! let mut tree = TreeArena::new();
//! let root = tree.insert_node(NodeData::checkbox("root"), None);
//! let a = tree.insert_node(NodeData::checkbox("a"), Some(root));
//! let b = tree.insert_node(NodeData::checkbox("b"), Some(root));
//!
//! on_user_toggle(&mut tree, a, true, AncestorWalk::ToRoot);
//! assert_eq!(tree.get_node(root).unwrap().state(), SelectionState::Indeterminate);
//!
//! on_user_toggle(&mut tree, b, true, AncestorWalk::ToRoot);
//! assert_eq!(tree.get_node(root).unwrap().state(), SelectionState::Checked);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
