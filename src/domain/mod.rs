//! Domain layer: selection tree model and state propagation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod propagation;

pub use arena::{NodeId, TreeArena, TreeNode};
pub use builder::{check_exclusive_groups, TreeBuilder, TreeResult, DEFAULT_MAX_DEPTH};
pub use entities::*;
pub use error::DomainError;
pub use propagation::{
    cascade_down, exclusive_group_reset, on_user_toggle, recompute_ancestors, reconcile,
    AncestorWalk,
};
