//! Tree definition loading
//!
//! Reads a TOML tree definition, validates it through the domain builder and
//! hands back a ready [`TreeView`].

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{
    ApplicationError, ApplicationResult, DefinitionResultExt, IoResultExt, TreeView,
};
use crate::config::EngineSettings;
use crate::domain::{check_exclusive_groups, reconcile, TreeArena, TreeBuilder, TreeDefinition};
use crate::infrastructure::traits::FileSystem;

/// Service turning definition files into selection trees.
pub struct TreeFileService {
    fs: Arc<dyn FileSystem>,
    engine: EngineSettings,
}

impl TreeFileService {
    pub fn new(fs: Arc<dyn FileSystem>, engine: EngineSettings) -> Self {
        Self { fs, engine }
    }

    pub fn engine(&self) -> &EngineSettings {
        &self.engine
    }

    /// Read and parse a definition file without building it.
    #[instrument(level = "debug", skip(self))]
    pub fn load_definition(&self, path: &Path) -> ApplicationResult<TreeDefinition> {
        let problem = if !self.fs.exists(path) {
            Some("no such file")
        } else if !self.fs.is_file(path) {
            Some("not a file")
        } else {
            None
        };
        if let Some(message) = problem {
            return Err(ApplicationError::InvalidDefinition {
                path: path.to_path_buf(),
                message: message.to_string(),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read tree definition", path)?;
        Self::parse(&content, path)
    }

    /// Parse definition text; `path` is only used for error context.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<TreeDefinition> {
        let definition: TreeDefinition = toml::from_str(content).with_definition_path(path)?;
        if definition.nodes.is_empty() {
            return Err(ApplicationError::InvalidDefinition {
                path: path.to_path_buf(),
                message: "no [[node]] entries".to_string(),
            });
        }
        Ok(definition)
    }

    /// Build a definition into a tree, reconciling branch states if configured.
    pub fn build(&self, definition: &TreeDefinition) -> ApplicationResult<TreeArena> {
        let mut tree = TreeBuilder::new()
            .with_max_depth(self.engine.max_depth)
            .build(definition)?;
        if self.engine.reconcile_on_load {
            reconcile(&mut tree);
            check_exclusive_groups(&tree)?;
        }
        debug!(nodes = tree.len(), reconciled = self.engine.reconcile_on_load, "tree ready");
        Ok(tree)
    }

    pub fn load_tree(&self, path: &Path) -> ApplicationResult<TreeArena> {
        let definition = self.load_definition(path)?;
        self.build(&definition)
    }

    /// Load a definition file into a view using the configured ancestor walk.
    pub fn open_view(&self, path: &Path) -> ApplicationResult<TreeView> {
        let tree = self.load_tree(path)?;
        Ok(TreeView::new(tree, self.engine.ancestor_walk))
    }
}
