use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, OnceLock,
};

use crate::{
    endpoint_candidates,
    update_feed::UpdaterFeed,
    update_flags::UpdateFlags,
    update_scheduler::UpdateScheduler,
    update_state::UpdateState,
    window_lifecycle::WindowSlot,
};

/// Process-wide shell state managed through `tauri::Manager`.
pub(crate) struct ShellState {
    pub(crate) candidates: Vec<String>,
    pub(crate) window_slot: Arc<WindowSlot>,
    pub(crate) update: Arc<UpdateRuntime>,
    pub(crate) update_feed: OnceLock<Arc<UpdaterFeed>>,
    pub(crate) update_scheduler: Mutex<Option<UpdateScheduler>>,
}

impl ShellState {
    pub(crate) fn from_environment() -> Self {
        Self {
            candidates: endpoint_candidates::startup_candidates(),
            window_slot: Arc::new(WindowSlot::default()),
            update: Arc::new(UpdateRuntime::new(UpdateFlags::detect())),
            update_feed: OnceLock::new(),
            update_scheduler: Mutex::new(None),
        }
    }
}

/// Mutable state of the update orchestrator. One instance per process; only
/// one check-through-download cycle may be in flight at a time.
#[derive(Debug)]
pub(crate) struct UpdateRuntime {
    pub(crate) flags: UpdateFlags,
    pub(crate) state: Mutex<UpdateState>,
    pub(crate) cycle_in_flight: AtomicBool,
}

impl UpdateRuntime {
    pub(crate) fn new(flags: UpdateFlags) -> Self {
        Self {
            flags,
            state: Mutex::new(UpdateState::Idle),
            cycle_in_flight: AtomicBool::new(false),
        }
    }

    pub(crate) fn snapshot(&self) -> UpdateState {
        match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn set_state(&self, next: UpdateState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct BridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateBridgeState {
    pub(crate) enabled: bool,
    pub(crate) state: &'static str,
    pub(crate) version: Option<String>,
    pub(crate) downloaded_fraction: Option<f64>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppUpdateCheckResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
    pub(crate) current_version: String,
    pub(crate) latest_version: Option<String>,
    pub(crate) has_update: bool,
}

/// RAII guard over a busy flag. `try_set` fails while another guard holds the
/// flag, which is what suppresses re-entrant update ticks.
pub(crate) struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub(crate) fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
