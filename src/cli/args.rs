//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::AncestorWalk;

/// Tri-state selection trees: preview and exercise checkbox/radio hierarchies
#[derive(Parser, Debug)]
#[command(name = "tritree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Override the configured ancestor walk (to-root | single-level)
    #[arg(long, global = true, env = "TRITREE_WALK")]
    pub walk: Option<AncestorWalk>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a tree with its selection state
    Show {
        /// Tree definition file, or a name looked up in the trees directory
        #[arg(value_hint = ValueHint::FilePath)]
        tree: String,
        /// Expand every branch before printing
        #[arg(short, long)]
        all: bool,
    },

    /// Apply toggles in order and print the resulting changes
    Toggle {
        /// Tree definition file, or a name looked up in the trees directory
        #[arg(value_hint = ValueHint::FilePath)]
        tree: String,
        /// Toggles as KEY=on|off
        #[arg(required = true, num_args = 1.., value_parser = parse_toggle)]
        toggles: Vec<Toggle>,
        /// Print only the change list, not the tree
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate a tree definition and print its figures
    Check {
        /// Tree definition file, or a name looked up in the trees directory
        #[arg(value_hint = ValueHint::FilePath)]
        tree: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show {
        /// Directory whose local .tritree.toml should be included
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<std::path::PathBuf>,
    },
    /// Print the global config file location
    Path,
}

/// One user toggle given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub key: String,
    pub checked: bool,
}

/// Parse `KEY=on|off` (also accepts true/false, 1/0, yes/no).
pub fn parse_toggle(s: &str) -> Result<Toggle, String> {
    let (key, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected KEY=on|off, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing node key in '{}'", s));
    }
    let checked = match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" | "x" => true,
        "off" | "false" | "0" | "no" | "" => false,
        other => return Err(format!("invalid toggle value '{}', expected on or off", other)),
    };
    Ok(Toggle {
        key: key.to_string(),
        checked,
    })
}
