//! Path utilities for Rollcall
//!
//! Handles tilde expansion and resolution of the app root, where the
//! browser profile, session state and logs live.

use std::path::PathBuf;

/// Expands a leading tilde (~) to the user's home directory.
/// "~/profiles" -> "/home/alice/profiles"
/// "/tmp/foo" -> "/tmp/foo" (no change)
pub fn expand_tilde(path: &str) -> String {
    if path == "~" {
        return home();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{}", home(), rest),
        None => path.to_string(),
    }
}

fn home() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}

/// Helper to convert a potentially tilde-containing string into a PathBuf.
pub fn get_path(path: &str) -> PathBuf {
    PathBuf::from(expand_tilde(path))
}

/// Resolves the Rollcall root from ROLLCALL_ROOT.
/// Handles absolute paths, tilde expansion, and bare names under $HOME.
pub fn get_app_root() -> PathBuf {
    let root_name = std::env::var("ROLLCALL_ROOT").unwrap_or_else(|_| ".rollcall".to_string());
    resolve_root(&root_name)
}

fn resolve_root(root_name: &str) -> PathBuf {
    if root_name.starts_with('/') {
        PathBuf::from(root_name)
    } else if root_name.starts_with('~') {
        get_path(root_name)
    } else {
        PathBuf::from(home()).join(root_name)
    }
}

/// Ensures a path is absolute, resolving tilde and relative to app root.
pub fn ensure_absolute(path: &str) -> PathBuf {
    let p = get_path(path);
    if p.is_absolute() {
        p
    } else {
        get_app_root().join(p)
    }
}

/// JSON file recording the CDP endpoint of the running browser.
pub fn session_file() -> PathBuf {
    get_app_root().join("browser_session.json")
}
