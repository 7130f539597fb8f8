#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod desktop_bridge_commands;
mod desktop_state;
mod endpoint_candidates;
mod endpoint_resolver;
mod logging;
mod probe_http;
mod runtime_paths;
mod startup_error;
mod startup_task;
mod update_feed;
mod update_flags;
mod update_orchestrator;
mod update_scheduler;
mod update_state;
mod window_lifecycle;

use std::sync::{Mutex, OnceLock};

pub(crate) use app_constants::*;
pub(crate) use app_types::{AtomicFlagGuard, BridgeResult, ShellState, UpdateRuntime};

static DESKTOP_LOG_WRITE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn main() {
    app_runtime::run();
}

fn append_desktop_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Runtime, message);
}

fn append_startup_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Startup, message);
}

fn append_update_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Update, message);
}

fn append_shutdown_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Shutdown, message);
}

fn append_desktop_log_with_category(category: logging::DesktopLogCategory, message: &str) {
    logging::append_desktop_log(
        category,
        message,
        runtime_paths::default_app_root_dir(),
        DESKTOP_LOG_FILE,
        DESKTOP_LOG_MAX_BYTES,
        LOG_BACKUP_COUNT,
        &DESKTOP_LOG_WRITE_LOCK,
    )
}
