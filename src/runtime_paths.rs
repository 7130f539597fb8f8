use std::path::PathBuf;

/// Root directory for desktop-shell state and logs (`~/.echochat`).
pub(crate) fn default_app_root_dir() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".echochat"))
}
