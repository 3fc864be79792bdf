//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tritree/tritree.toml`
//! 3. Local config: `.tritree.toml` in the directory of the tree definition
//! 4. Environment variables: `TRITREE_*` prefix, `__` as section separator

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{AncestorWalk, DEFAULT_MAX_DEPTH};
use crate::util::path::expand_env_vars;

/// Propagation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// How far ancestor recomputation walks after a toggle
    pub ancestor_walk: AncestorWalk,
    /// Re-derive branch states from their children after loading a tree
    pub reconcile_on_load: bool,
    /// Deepest tree the builder accepts
    pub max_depth: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ancestor_walk: AncestorWalk::ToRoot,
            reconcile_on_load: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Text rendering settings for the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Render children of closed branches too
    pub show_collapsed: bool,
    /// Append the node key to its label
    pub show_keys: bool,
}

/// Raw engine settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawEngineSettings {
    pub ancestor_walk: Option<AncestorWalk>,
    pub reconcile_on_load: Option<bool>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplaySettings {
    pub show_collapsed: Option<bool>,
    pub show_keys: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub trees_dir: Option<PathBuf>,
    pub engine: RawEngineSettings,
    pub display: RawDisplaySettings,
}

impl EngineSettings {
    fn merge(&self, overlay: &RawEngineSettings) -> Self {
        Self {
            ancestor_walk: overlay.ancestor_walk.unwrap_or(self.ancestor_walk),
            reconcile_on_load: overlay.reconcile_on_load.unwrap_or(self.reconcile_on_load),
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
        }
    }
}

impl DisplaySettings {
    fn merge(&self, overlay: &RawDisplaySettings) -> Self {
        Self {
            show_collapsed: overlay.show_collapsed.unwrap_or(self.show_collapsed),
            show_keys: overlay.show_keys.unwrap_or(self.show_keys),
        }
    }
}

/// Unified configuration for tritree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory searched for tree definitions given by name
    pub trees_dir: PathBuf,
    pub engine: EngineSettings,
    pub display: DisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trees_dir: default_trees_dir(),
            engine: EngineSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

/// Get the default trees directory (`$XDG_DATA_HOME/tritree/trees`).
fn default_trees_dir() -> PathBuf {
    ProjectDirs::from("", "", "tritree")
        .map(|dirs| dirs.data_dir().join("trees"))
        .unwrap_or_else(|| PathBuf::from("~/.tritree/trees"))
}

/// Get the XDG config directory for tritree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tritree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tritree.toml"))
}

/// Get the path to the local config file in a tree directory.
pub fn local_config_path(tree_dir: &Path) -> PathBuf {
    tree_dir.join(".tritree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.trees_dir.to_string_lossy().as_ref());
        self.trees_dir = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            trees_dir: overlay
                .trees_dir
                .clone()
                .unwrap_or_else(|| self.trees_dir.clone()),
            engine: self.engine.merge(&overlay.engine),
            display: self.display.merge(&overlay.display),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `tree_dir` - Optional directory of the tree definition, for local config
    pub fn load(tree_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config next to the tree definition
        if let Some(dir) = tree_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply TRITREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TRITREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("trees_dir") {
            settings.trees_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("engine.ancestor_walk") {
            settings.engine.ancestor_walk = val.parse().map_err(|message| ApplicationError::Config {
                message: format!("TRITREE_ENGINE__ANCESTOR_WALK: {}", message),
            })?;
        }
        if let Ok(val) = config.get_bool("engine.reconcile_on_load") {
            settings.engine.reconcile_on_load = val;
        }
        if let Ok(val) = config.get_int("engine.max_depth") {
            settings.engine.max_depth = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("TRITREE_ENGINE__MAX_DEPTH must not be negative: {}", val),
            })?;
        }
        if let Ok(val) = config.get_bool("display.show_collapsed") {
            settings.display.show_collapsed = val;
        }
        if let Ok(val) = config.get_bool("display.show_keys") {
            settings.display.show_keys = val;
        }

        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
