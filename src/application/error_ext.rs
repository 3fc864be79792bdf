//! Error conversion helpers for loading tree definitions
//!
//! Provides extension traits that attach the definition path to I/O and
//! parse failures.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read tree definition", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Extension trait for TOML parse results of a definition file.
pub trait DefinitionResultExt<T> {
    fn with_definition_path(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> DefinitionResultExt<T> for Result<T, toml::de::Error> {
    fn with_definition_path(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::InvalidDefinition {
            path: path.to_path_buf(),
            message: e.to_string().trim_end().to_string(),
        })
    }
}
