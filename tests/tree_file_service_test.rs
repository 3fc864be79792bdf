//! Integration tests for loading tree definitions from disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use tritree::application::services::TreeFileService;
use tritree::application::ApplicationError;
use tritree::cli::render::TreeRender;
use tritree::config::{EngineSettings, Settings};
use tritree::domain::{AncestorWalk, DomainError, SelectionState};
use tritree::infrastructure::traits::RealFileSystem;
use tritree::infrastructure::ServiceContainer;
use tritree::util::testing;

fn service() -> TreeFileService {
    testing::init_test_setup();
    TreeFileService::new(Arc::new(RealFileSystem), EngineSettings::default())
}

// ============================================================
// Valid definitions
// ============================================================

#[test]
fn given_catalog_definition_when_loading_then_structure_is_preserved() {
    let tree = service()
        .load_tree(Path::new("tests/resources/trees/catalog.toml"))
        .expect("load catalog");

    let stats = tree.stats();
    assert_eq!(stats.nodes, 11);
    assert_eq!(stats.roots, 2);
    assert_eq!(stats.depth, 4);
    assert_eq!(stats.groups, vec!["size".to_string()]);
    assert_eq!(tree.leaf_nodes(), vec!["a1", "a2", "x1", "y1", "z1"]);

    let root = tree.get_node(tree.find("root").unwrap()).unwrap();
    assert_eq!(root.data.label, "Everything");
    assert!(root.open);
}

#[test]
fn given_definition_in_temp_dir_when_opening_view_then_checked_leaves_drive_branches() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pizza.toml");
    fs::write(
        &path,
        r#"
[[node]]
key = "toppings"

[[node]]
key = "cheese"
parent = "toppings"
checked = true

[[node]]
key = "olives"
parent = "toppings"
checked = true
"#,
    )
    .unwrap();

    let view = service().open_view(&path).expect("open view");

    assert_eq!(view.state("toppings").unwrap(), SelectionState::Checked);
    assert_eq!(view.walk(), AncestorWalk::ToRoot);
}

// ============================================================
// Invalid definitions
// ============================================================

#[test]
fn given_parent_cycle_when_loading_then_returns_cycle_error() {
    let err = service()
        .load_tree(Path::new("tests/resources/trees/invalid/cycle.toml"))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CycleDetected(_))
    ));
}

#[test]
fn given_two_preselected_radios_when_loading_then_returns_group_conflict() {
    let err = service()
        .load_tree(Path::new("tests/resources/trees/invalid/two_selected.toml"))
        .unwrap_err();

    match err {
        ApplicationError::Domain(DomainError::GroupConflict { group, keys }) => {
            assert_eq!(group, "size");
            assert_eq!(keys, vec!["small".to_string(), "large".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_checked_child_under_unselected_radio_when_reconciling_then_returns_group_conflict() {
    let path = Path::new("tests/resources/trees/invalid/derived_selection.toml");

    let err = service().load_tree(path).unwrap_err();

    match err {
        ApplicationError::Domain(DomainError::GroupConflict { group, keys }) => {
            assert_eq!(group, "g");
            assert_eq!(keys, vec!["Y".to_string(), "Z".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    // without reconcile the definition flags stand as written
    let engine = EngineSettings {
        reconcile_on_load: false,
        ..EngineSettings::default()
    };
    let tree = TreeFileService::new(Arc::new(RealFileSystem), engine)
        .load_tree(path)
        .expect("load without reconcile");
    let selected: Vec<&str> = tree
        .group_members("g")
        .iter()
        .filter_map(|&idx| tree.get_node(idx))
        .filter(|n| n.checked)
        .map(|n| n.key())
        .collect();
    assert_eq!(selected, vec!["Y"]);
}

#[test]
fn given_misspelled_field_when_loading_then_error_names_file_and_field() {
    let err = service()
        .load_tree(Path::new("tests/resources/trees/invalid/typo.toml"))
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, ApplicationError::InvalidDefinition { .. }));
    assert!(message.contains("typo.toml"), "{}", message);
    assert!(message.contains("chekced"), "{}", message);
}

#[test]
fn given_directory_or_missing_path_when_loading_then_returns_invalid_definition() {
    let temp = TempDir::new().unwrap();

    let not_file = service().load_tree(temp.path()).unwrap_err();
    assert!(not_file.to_string().contains("not a file"));

    let missing = service()
        .load_tree(&temp.path().join("missing.toml"))
        .unwrap_err();
    assert!(missing.to_string().contains("no such file"));
}

#[test]
fn given_depth_limit_when_tree_is_deeper_then_returns_depth_error() {
    let engine = EngineSettings {
        max_depth: 3,
        ..EngineSettings::default()
    };
    let err = TreeFileService::new(Arc::new(RealFileSystem), engine)
        .load_tree(Path::new("tests/resources/trees/catalog.toml"))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DepthExceeded { max: 3, .. })
    ));
}

// ============================================================
// Service container with local config
// ============================================================

#[test]
fn given_local_config_when_wiring_container_then_engine_uses_single_level_walk() {
    testing::init_test_setup();
    let dir = Path::new("tests/resources/trees/local");
    let settings = Settings::load(Some(dir)).expect("load settings");
    let container = ServiceContainer::new(settings);
    assert_eq!(
        container.tree_files.engine().ancestor_walk,
        AncestorWalk::SingleLevel
    );

    let mut view = container
        .tree_files
        .open_view(&dir.join("menu.toml"))
        .expect("open menu");
    assert_eq!(view.state("starters").unwrap(), SelectionState::Indeterminate);
    assert_eq!(view.state("menu").unwrap(), SelectionState::Indeterminate);

    let changes = view.toggle("salad", true).unwrap();

    assert_eq!(view.state("starters").unwrap(), SelectionState::Checked);
    // a single-level walk leaves the grandparent as it was
    assert_eq!(view.state("menu").unwrap(), SelectionState::Indeterminate);
    assert!(changes.get("menu").is_none());

    let rendered = view.tree().render(&container.settings.display);
    assert!(rendered.starts_with("> [-] menu"), "{}", rendered);
    assert!(!rendered.contains("salad"), "{}", rendered);
}
