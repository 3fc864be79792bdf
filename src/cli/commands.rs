//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, Toggle};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::render::TreeRender;
use crate::config::{global_config_path, Settings};
use crate::domain::SelectionState;
use crate::infrastructure::{InfraError, ServiceContainer};
use crate::util::path::resolve_tree_path;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show { tree, all }) => cmd_show(cli, tree, *all),
        Some(Commands::Toggle {
            tree,
            toggles,
            quiet,
        }) => cmd_toggle(cli, tree, toggles, *quiet),
        Some(Commands::Check { tree }) => cmd_check(cli, tree),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show { dir } => cmd_config_show(dir.as_deref()),
            ConfigCommands::Path => cmd_config_path(),
        },
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "tritree", &mut io::stdout());
            Ok(())
        }
        None => Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e).into()),
    }
}

/// Resolve the tree argument and wire services with the settings that apply to it.
fn open_tree(cli: &Cli, tree: &str) -> CliResult<(ServiceContainer, PathBuf)> {
    let base = Settings::load(None)?;
    let path = resolve_tree_path(tree, &base.trees_dir)
        .ok_or_else(|| CliError::TreeNotFound(tree.to_string()))?;

    let mut settings = Settings::load(path.parent())?;
    if let Some(walk) = cli.walk {
        settings.engine.ancestor_walk = walk;
    }
    debug!(path = %path.display(), walk = %settings.engine.ancestor_walk, "tree resolved");

    Ok((ServiceContainer::new(settings), path))
}

#[instrument(skip(cli))]
fn cmd_show(cli: &Cli, tree: &str, all: bool) -> CliResult<()> {
    let (container, path) = open_tree(cli, tree)?;
    let mut view = container.tree_files.open_view(&path)?;
    if all {
        view.expand_all();
    }

    output::header(&path.display());
    output::info(&view.tree().render(&container.settings.display).trim_end());
    Ok(())
}

#[instrument(skip(cli, toggles))]
fn cmd_toggle(cli: &Cli, tree: &str, toggles: &[Toggle], quiet: bool) -> CliResult<()> {
    let (container, path) = open_tree(cli, tree)?;
    let mut view = container.tree_files.open_view(&path)?;
    view.subscribe(|event| debug!(?event, "tree event"));

    for toggle in toggles {
        let changes = view.toggle(&toggle.key, toggle.checked)?;
        let value = if toggle.checked { "on" } else { "off" };
        output::action("toggle", &format!("{}={}", toggle.key, value));

        if changes.is_empty() {
            output::detail("no change");
        }
        for change in &changes.changes {
            let line = format!("{}: {} -> {}", change.key, change.before, change.after);
            match change.after {
                SelectionState::Checked => output::diff_add(&line),
                SelectionState::Unchecked => output::diff_remove(&line),
                SelectionState::Indeterminate => output::diff_mixed(&line),
            }
        }
    }

    if !quiet {
        output::info("");
        output::header(&path.display());
        output::info(&view.tree().render(&container.settings.display).trim_end());
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_check(cli: &Cli, tree: &str) -> CliResult<()> {
    let (container, path) = open_tree(cli, tree)?;
    let arena = container.tree_files.load_tree(&path)?;
    let stats = arena.stats();

    output::success(&format!("{} is valid", path.display()));
    output::detail(&format!("nodes:  {}", stats.nodes));
    output::detail(&format!("roots:  {}", stats.roots));
    output::detail(&format!("leaves: {}", stats.leaves));
    output::detail(&format!("depth:  {}", stats.depth));
    for group in &stats.groups {
        let members = arena.group_members(group);
        let selected = members
            .iter()
            .filter_map(|&idx| arena.get_node(idx))
            .find(|n| n.checked)
            .map(|n| n.data.key.as_str())
            .unwrap_or("-");
        output::detail(&format!(
            "group {}: {} radios, selected {}",
            group,
            members.len(),
            selected
        ));
    }
    Ok(())
}

fn cmd_config_show(dir: Option<&Path>) -> CliResult<()> {
    let settings = Settings::load(dir)?;
    output::info(&settings.to_toml()?.trim_end());
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    match global_config_path() {
        Some(path) => {
            output::info(&path.display());
            Ok(())
        }
        None => Err(CliError::InvalidArgs(
            "no home directory, global config unavailable".to_string(),
        )),
    }
}
