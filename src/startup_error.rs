use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use thiserror::Error;

use crate::append_startup_log;

/// Failures that can occur before a usable window exists. These are the only
/// fatal errors in the shell; everything after bootstrap is logged and
/// absorbed.
#[derive(Debug, Error)]
pub(crate) enum StartupFailure {
    #[error("no backend endpoint is reachable (tried: {})", .tried.join(", "))]
    UnreachableBackend { tried: Vec<String> },
    #[error("failed to create the main window: {0}")]
    WindowCreation(String),
}

/// Single fatal path: report the failure in a blocking dialog (no window may
/// exist to host anything else) and terminate the process.
pub(crate) fn handle_startup_failure(app_handle: &AppHandle, failure: &StartupFailure) {
    let message = failure.to_string();
    append_startup_log(&format!("fatal startup failure: {message}"));

    app_handle
        .dialog()
        .message(format!("EchoChat failed to start.\n\n{message}"))
        .title("EchoChat startup failed")
        .kind(MessageDialogKind::Error)
        .buttons(MessageDialogButtons::Ok)
        .blocking_show();

    app_handle.exit(1);
}

#[cfg(test)]
mod tests {
    use super::StartupFailure;

    #[test]
    fn unreachable_failure_names_every_attempted_candidate() {
        let failure = StartupFailure::UnreachableBackend {
            tried: vec!["http://a/".to_string(), "http://b/".to_string()],
        };
        let rendered = failure.to_string();
        assert!(rendered.contains("http://a/"));
        assert!(rendered.contains("http://b/"));
    }

    #[test]
    fn window_creation_failure_carries_the_platform_error() {
        let failure = StartupFailure::WindowCreation("webview backend missing".to_string());
        assert!(failure.to_string().contains("webview backend missing"));
    }
}
