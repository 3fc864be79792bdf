//! Application layer: tree views and use cases
//!
//! This layer drives the domain engine on behalf of a binding layer and
//! depends on I/O boundary traits for loading tree definitions.

pub mod error;
pub mod error_ext;
pub mod services;
pub mod view;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{DefinitionResultExt, IoResultExt};
pub use view::{ChangeSet, NodeChange, SubscriptionId, TreeEvent, TreeView};
