//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed tree definitions.
/// The propagation engine itself never fails; everything it relies on is
/// checked here, when the tree is built.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate node key: {0}")]
    DuplicateKey(String),

    #[error("node '{key}' references unknown parent '{parent}'")]
    UnknownParent { key: String, parent: String },

    #[error("cycle detected in hierarchy: {0}")]
    CycleDetected(String),

    #[error("radio '{0}' has no group")]
    MissingGroup(String),

    #[error("checkbox '{0}' declares a group, only radios can")]
    UnexpectedGroup(String),

    #[error("radio group '{group}' has more than one checked member: {keys:?}")]
    GroupConflict { group: String, keys: Vec<String> },

    #[error("radio '{key}' is nested under '{ancestor}' of the same group '{group}'")]
    NestedGroupMember {
        group: String,
        key: String,
        ancestor: String,
    },

    #[error("node '{key}' exceeds the maximum tree depth of {max}")]
    DepthExceeded { key: String, max: usize },

    #[error("invalid node definition: {message}")]
    InvalidNode { message: String },
}
