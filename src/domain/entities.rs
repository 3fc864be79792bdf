//! Domain entities: node payloads and declarative tree definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Selection input carried by a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Tri-state checkbox
    Checkbox,
    /// Radio, mutually exclusive with every other radio of `group` in the tree
    Radio { group: String },
}

impl InputKind {
    pub fn is_radio(&self) -> bool {
        matches!(self, InputKind::Radio { .. })
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            InputKind::Radio { group } => Some(group),
            InputKind::Checkbox => None,
        }
    }
}

/// Observable state of a node as the binding layer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionState {
    Unchecked,
    Checked,
    /// Children disagree
    Indeterminate,
}

impl SelectionState {
    /// Derive the observable state from the raw flags.
    ///
    /// `indeterminate` takes precedence: a node can carry `checked = false`
    /// and `indeterminate = true` at the same time.
    pub fn from_flags(checked: bool, indeterminate: bool) -> Self {
        match (checked, indeterminate) {
            (_, true) => SelectionState::Indeterminate,
            (true, false) => SelectionState::Checked,
            (false, false) => SelectionState::Unchecked,
        }
    }
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionState::Unchecked => "unchecked",
            SelectionState::Checked => "checked",
            SelectionState::Indeterminate => "indeterminate",
        };
        write!(f, "{}", s)
    }
}

/// Data payload for tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Unique key within the tree, used by the binding layer to address nodes
    pub key: String,
    /// Display label
    pub label: String,
    /// Selection input of this node
    pub input: InputKind,
}

impl NodeData {
    pub fn checkbox(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            input: InputKind::Checkbox,
        }
    }

    pub fn radio(key: impl Into<String>, group: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            input: InputKind::Radio {
                group: group.into(),
            },
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Input kind tag as written in definition files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
    #[default]
    Checkbox,
    Radio,
}

/// One `[[node]]` table of a tree definition.
///
/// Nesting is expressed through `parent` keys, so tables may appear in any
/// order; siblings keep the order in which they are declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDefinition {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub kind: KindTag,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub checked: bool,
    /// Branch starts expanded
    #[serde(default)]
    pub open: bool,
}

impl NodeDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
            parent: None,
            kind: KindTag::Checkbox,
            group: None,
            checked: false,
            open: false,
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn radio(mut self, group: impl Into<String>) -> Self {
        self.kind = KindTag::Radio;
        self.group = Some(group.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }
}

/// Declarative tree, as read from a definition file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDefinition {
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeDefinition>,
}

impl TreeDefinition {
    pub fn new(nodes: Vec<NodeDefinition>) -> Self {
        Self { nodes }
    }
}

/// Summary figures for a built tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub roots: usize,
    pub leaves: usize,
    pub depth: usize,
    /// Radio group names, sorted
    pub groups: Vec<String>,
}
