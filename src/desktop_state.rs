use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

const AUTO_UPDATE_FIELD: &str = "autoUpdateCheck";

fn desktop_state_path(app_root_dir: Option<&Path>) -> Option<PathBuf> {
    app_root_dir.map(|root| root.join("data").join("desktop_state.json"))
}

/// Persisted dashboard preference for the automatic update check. Missing or
/// malformed state means "no preference".
pub(crate) fn read_cached_auto_update_enabled(app_root_dir: Option<&Path>) -> Option<bool> {
    let state_path = desktop_state_path(app_root_dir)?;
    let raw = fs::read_to_string(state_path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.get(AUTO_UPDATE_FIELD)?.as_bool()
}
