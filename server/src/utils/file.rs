//! File utility functions

use std::path::PathBuf;

/// Resolve a user-supplied path (config, field map, CLI input) to an
/// absolute path.
///
/// `~` and `~/...` expand to the home directory; relative paths resolve
/// against the current directory without canonicalizing; an empty string is
/// the current directory.
///
/// ```text
/// expand_path("~/.elastic-builder") // -> /home/user/.elastic-builder
/// expand_path("fields.json")        // -> /current/dir/fields.json
/// expand_path("/etc/fields.json")   // -> /etc/fields.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|h| h.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}
