use std::time::Duration;

pub(crate) const DEFAULT_BACKEND_CANDIDATES: [&str; 2] =
    ["http://127.0.0.1:6285/", "http://localhost:6285/"];

pub(crate) const BACKEND_URL_ENV: &str = "ECHOCHAT_BACKEND_URL";
pub(crate) const DEVTOOLS_ENV: &str = "ECHOCHAT_DEVTOOLS";
pub(crate) const DISABLE_UPDATES_ENV: &str = "ECHOCHAT_DISABLE_UPDATES";
pub(crate) const PROBE_TIMEOUT_ENV: &str = "ECHOCHAT_PROBE_TIMEOUT_MS";
pub(crate) const PROBE_RETRY_INTERVAL_ENV: &str = "ECHOCHAT_PROBE_RETRY_INTERVAL_MS";

pub(crate) const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;
pub(crate) const PROBE_TIMEOUT_MIN_MS: u64 = 500;
pub(crate) const PROBE_TIMEOUT_MAX_MS: u64 = 120_000;
pub(crate) const DEFAULT_PROBE_RETRY_INTERVAL_MS: u64 = 300;
pub(crate) const PROBE_RETRY_INTERVAL_MIN_MS: u64 = 50;
pub(crate) const PROBE_RETRY_INTERVAL_MAX_MS: u64 = 5_000;
pub(crate) const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_millis(800);

pub(crate) const UPDATE_INITIAL_DELAY: Duration = Duration::from_secs(10);
pub(crate) const UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const MAIN_WINDOW_TITLE: &str = "EchoChat";

pub(crate) const DESKTOP_LOG_FILE: &str = "desktop.log";
pub(crate) const DESKTOP_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub(crate) const LOG_BACKUP_COUNT: usize = 5;
