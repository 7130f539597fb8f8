use std::process::{Command, Stdio};
use std::sync::Arc;

use tauri::{AppHandle, Manager};
use tauri_plugin_updater::UpdaterExt;
use url::Url;

use crate::{
    append_desktop_log, append_update_log,
    app_types::{AppUpdateCheckResult, UpdateBridgeState},
    update_feed::UpdaterFeed,
    update_orchestrator::{self, CycleOutcome, DialogPrompt},
    BridgeResult, ShellState,
};

fn parse_openable_url(raw_url: &str) -> Result<Url, String> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err("Missing external URL.".to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|error| format!("Invalid URL: {error}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(format!(
            "Unsupported URL scheme '{scheme}', only http/https are allowed."
        )),
    }
}

#[cfg(target_os = "macos")]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    Command::new("open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run 'open': {error}"))
}

#[cfg(target_os = "windows")]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    Command::new("rundll32")
        .args(["url.dll,FileProtocolHandler", url])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run 'rundll32': {error}"))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    Command::new("xdg-open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run 'xdg-open': {error}"))
}

#[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
fn open_url_with_system_browser(_url: &str) -> Result<(), String> {
    Err("Opening external URLs is not supported on this platform.".to_string())
}

#[tauri::command]
pub(crate) fn desktop_bridge_is_desktop_runtime() -> bool {
    true
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_update_state(app_handle: AppHandle) -> UpdateBridgeState {
    let state = app_handle.state::<ShellState>();
    let snapshot = state.update.snapshot();
    UpdateBridgeState {
        enabled: state.update.flags.enabled,
        state: snapshot.label(),
        version: snapshot.info().map(|info| info.version.clone()),
        downloaded_fraction: snapshot.info().map(|info| info.downloaded_fraction),
    }
}

#[tauri::command]
pub(crate) fn desktop_bridge_open_external_url(url: String) -> BridgeResult {
    let parsed = match parse_openable_url(&url) {
        Ok(parsed) => parsed,
        Err(error) => {
            return BridgeResult {
                ok: false,
                reason: Some(error),
            };
        }
    };

    match open_url_with_system_browser(parsed.as_ref()) {
        Ok(()) => BridgeResult {
            ok: true,
            reason: None,
        },
        Err(error) => BridgeResult {
            ok: false,
            reason: Some(error),
        },
    }
}

#[tauri::command]
pub(crate) async fn desktop_bridge_check_app_update(app_handle: AppHandle) -> AppUpdateCheckResult {
    let current_version = app_handle.package_info().version.to_string();

    let updater = match app_handle.updater() {
        Ok(updater) => updater,
        Err(error) => {
            let reason = format!("Failed to initialize updater: {error}");
            append_update_log(&reason);
            return AppUpdateCheckResult {
                ok: false,
                reason: Some(reason),
                current_version,
                latest_version: None,
                has_update: false,
            };
        }
    };

    match updater.check().await {
        Ok(Some(update)) => AppUpdateCheckResult {
            ok: true,
            reason: None,
            current_version,
            latest_version: Some(update.version.to_string()),
            has_update: true,
        },
        Ok(None) => AppUpdateCheckResult {
            ok: true,
            reason: None,
            current_version: current_version.clone(),
            latest_version: Some(current_version),
            has_update: false,
        },
        Err(error) => {
            // a missing feed manifest is normal before the first release;
            // report "no update" instead of an error the dashboard would show
            append_update_log(&format!("manual update check failed: {error}"));
            AppUpdateCheckResult {
                ok: true,
                reason: None,
                current_version,
                latest_version: None,
                has_update: false,
            }
        }
    }
}

/// Manual install path for the dashboard. Runs a full cycle through the same
/// orchestrator entry point, so it cannot overlap a periodic cycle.
#[tauri::command]
pub(crate) async fn desktop_bridge_install_app_update(app_handle: AppHandle) -> BridgeResult {
    let (runtime, feed, prompt) = {
        let state = app_handle.state::<ShellState>();
        let feed = state
            .update_feed
            .get_or_init(|| Arc::new(UpdaterFeed::new(app_handle.clone())))
            .clone();
        let prompt = DialogPrompt {
            app_handle: app_handle.clone(),
            window_slot: state.window_slot.clone(),
        };
        (state.update.clone(), feed, prompt)
    };

    let cycle = tauri::async_runtime::spawn_blocking(move || {
        update_orchestrator::run_cycle(&runtime, feed.as_ref(), &prompt, |message| {
            append_update_log(message)
        })
    })
    .await;

    let outcome = match cycle {
        Ok(outcome) => outcome,
        Err(error) => {
            let reason = format!("Update task failed: {error}");
            append_desktop_log(&reason);
            return BridgeResult {
                ok: false,
                reason: Some(reason),
            };
        }
    };

    match outcome {
        CycleOutcome::InstallRequested => {
            append_update_log("requesting application restart");
            app_handle.request_restart();
            BridgeResult {
                ok: true,
                reason: None,
            }
        }
        CycleOutcome::Deferred => BridgeResult {
            ok: true,
            reason: Some("user deferred the update".to_string()),
        },
        CycleOutcome::UpToDate => BridgeResult {
            ok: true,
            reason: Some("already on the latest version".to_string()),
        },
        CycleOutcome::TickDropped => BridgeResult {
            ok: false,
            reason: Some("An update cycle is already in progress.".to_string()),
        },
        CycleOutcome::Failed => BridgeResult {
            ok: false,
            reason: Some("Update check or download failed; see the desktop log.".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::parse_openable_url;

    #[test]
    fn parse_openable_url_accepts_http_and_https() {
        assert!(parse_openable_url("https://echochat.chat/docs").is_ok());
        assert!(parse_openable_url("  http://example.net  ").is_ok());
    }

    #[test]
    fn parse_openable_url_rejects_other_schemes_and_garbage() {
        assert!(parse_openable_url("file:///etc/passwd").is_err());
        assert!(parse_openable_url("javascript:alert(1)").is_err());
        assert!(parse_openable_url("").is_err());
        assert!(parse_openable_url("not a url").is_err());
    }
}
