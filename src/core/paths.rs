//! Default locations and path normalization for config and data files.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Home directory, falling back to `/tmp` when `HOME` is unset.
pub fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[FLT-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

/// `~/.config/fleetdesk`
pub fn config_dir() -> PathBuf {
    home_dir().join(".config").join("fleetdesk")
}

/// `~/.local/share/fleetdesk`
pub fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("fleetdesk")
}

/// Make a user-supplied data path absolute without touching the filesystem
/// beyond `canonicalize`.
///
/// Existing paths are canonicalized; missing ones are joined onto the CWD and
/// `.`/`..` components are folded syntactically.
pub fn resolve_data_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    std::fs::canonicalize(&absolute).unwrap_or_else(|_| fold_components(&absolute))
}

fn fold_components(path: &Path) -> PathBuf {
    let mut kept: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(kept.last(), Some(Component::Normal(_))) {
                    kept.pop();
                }
            }
            other => kept.push(other),
        }
    }
    kept.into_iter().collect()
}
