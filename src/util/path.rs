use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory. Unresolvable
/// input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

pub fn is_tree_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("toml"))
}

/// Locate a tree definition.
///
/// `candidate` is used as given when it exists; otherwise a relative name is
/// looked up in `trees_dir`, with a `.toml` extension added when missing.
pub fn resolve_tree_path(candidate: &str, trees_dir: &Path) -> Option<PathBuf> {
    let direct = PathBuf::from(expand_env_vars(candidate));
    if direct.is_file() {
        return Some(direct);
    }
    if direct.is_absolute() {
        return None;
    }

    let in_dir = trees_dir.join(&direct);
    if in_dir.is_file() {
        return Some(in_dir);
    }
    if !is_tree_file(&in_dir) {
        let with_ext = in_dir.with_extension("toml");
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    None
}

// Helper function for cross-platform path comparison
pub fn normalize_path_separator(s: &str) -> String {
    s.replace('\\', "/")
}
