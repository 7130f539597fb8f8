use std::sync::Mutex;

use tauri::AppHandle;
use tauri_plugin_updater::UpdaterExt;

/// Events one check-through-download pass can emit, in cycle order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FeedEvent {
    Checking,
    UpToDate,
    UpdateAvailable { version: String },
    DownloadProgress { fraction: f64 },
    Downloaded { version: String },
    Error { message: String },
}

/// Narrow view of the update feed. The orchestrator only consumes events and
/// asks for the last downloaded artifact to be installed; how the feed is
/// fetched or hosted is not its concern.
pub(crate) trait UpdateFeed {
    /// Runs one check pass, downloading immediately when an update exists.
    /// All outcomes, including failures, surface as events.
    fn run_check(&self, emit: &mut dyn FnMut(FeedEvent));

    /// Installs the artifact kept by the last successful download.
    fn install_downloaded(&self) -> Result<(), String>;

    fn has_downloaded_artifact(&self) -> bool;
}

/// Real feed over `tauri-plugin-updater`. The downloaded bytes are kept so a
/// deferred update can still be installed when the application quits.
pub(crate) struct UpdaterFeed {
    app_handle: AppHandle,
    artifact: Mutex<Option<DownloadedArtifact>>,
}

struct DownloadedArtifact {
    update: tauri_plugin_updater::Update,
    bytes: Vec<u8>,
}

impl UpdaterFeed {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self {
            app_handle,
            artifact: Mutex::new(None),
        }
    }

    fn store_artifact(&self, update: tauri_plugin_updater::Update, bytes: Vec<u8>) {
        let artifact = Some(DownloadedArtifact { update, bytes });
        match self.artifact.lock() {
            Ok(mut guard) => *guard = artifact,
            Err(poisoned) => *poisoned.into_inner() = artifact,
        }
    }

    fn take_artifact(&self) -> Option<DownloadedArtifact> {
        match self.artifact.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl UpdateFeed for UpdaterFeed {
    fn run_check(&self, emit: &mut dyn FnMut(FeedEvent)) {
        emit(FeedEvent::Checking);

        let updater = match self.app_handle.updater() {
            Ok(updater) => updater,
            Err(error) => {
                emit(FeedEvent::Error {
                    message: format!("failed to initialize updater: {error}"),
                });
                return;
            }
        };

        let update = match tauri::async_runtime::block_on(updater.check()) {
            Ok(Some(update)) => update,
            Ok(None) => {
                emit(FeedEvent::UpToDate);
                return;
            }
            Err(error) => {
                emit(FeedEvent::Error {
                    message: format!("update check failed: {error}"),
                });
                return;
            }
        };

        let version = update.version.to_string();
        emit(FeedEvent::UpdateAvailable {
            version: version.clone(),
        });

        let mut received: u64 = 0;
        let downloaded = {
            let emit_progress = &mut *emit;
            tauri::async_runtime::block_on(update.download(
                |chunk, total| {
                    received += chunk as u64;
                    if let Some(total) = total.filter(|total| *total > 0) {
                        emit_progress(FeedEvent::DownloadProgress {
                            fraction: (received as f64 / total as f64).min(1.0),
                        });
                    }
                },
                || {},
            ))
        };

        match downloaded {
            Ok(bytes) => {
                self.store_artifact(update, bytes);
                emit(FeedEvent::Downloaded { version });
            }
            Err(error) => emit(FeedEvent::Error {
                message: format!("update download failed: {error}"),
            }),
        }
    }

    fn install_downloaded(&self) -> Result<(), String> {
        let artifact = self
            .take_artifact()
            .ok_or_else(|| "no downloaded update artifact".to_string())?;
        artifact
            .update
            .install(&artifact.bytes)
            .map_err(|error| format!("update install failed: {error}"))
    }

    fn has_downloaded_artifact(&self) -> bool {
        match self.artifact.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}
