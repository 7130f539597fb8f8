use std::{sync::Arc, time::Duration};

use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use crate::{
    update_feed::{FeedEvent, UpdateFeed, UpdaterFeed},
    update_flags::UpdateFlags,
    update_scheduler::UpdateScheduler,
    update_state::UpdateState,
    window_lifecycle::WindowSlot,
    AtomicFlagGuard, ShellState, UpdateRuntime, UPDATE_CHECK_INTERVAL, UPDATE_INITIAL_DELAY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RestartChoice {
    RestartNow,
    Later,
}

/// Capability the orchestrator uses to talk to the user. It only ever asks
/// whether a window is alive and, if so, requests prompts; it never touches
/// the window itself.
pub(crate) trait UpdatePrompt {
    fn window_alive(&self) -> bool;
    fn notify_downloading(&self, version: &str);
    fn confirm_restart(&self, version: &str) -> RestartChoice;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleOutcome {
    /// The tick landed while a cycle was in flight and was dropped.
    TickDropped,
    UpToDate,
    /// Check or download failed; the next periodic tick retries.
    Failed,
    /// Downloaded but deferred by the user; the artifact installs on quit.
    Deferred,
    /// Installed; the caller requests the process restart.
    InstallRequested,
}

/// One update cycle: check, download, and settle the downloaded artifact
/// with the user. Re-entrant triggers are suppressed, never queued.
pub(crate) fn run_cycle<F, P, L>(
    runtime: &UpdateRuntime,
    feed: &F,
    prompt: &P,
    log: L,
) -> CycleOutcome
where
    F: UpdateFeed + ?Sized,
    P: UpdatePrompt + ?Sized,
    L: Fn(&str),
{
    let Some(_cycle_guard) = AtomicFlagGuard::try_set(&runtime.cycle_in_flight) else {
        log("update tick dropped: a cycle is already in flight");
        return CycleOutcome::TickDropped;
    };
    if !runtime.snapshot().is_idle() {
        log("update tick dropped: update state is not idle");
        return CycleOutcome::TickDropped;
    }

    let mut cycle_failed = false;
    feed.run_check(&mut |event| {
        match &event {
            FeedEvent::Checking => log("checking for updates"),
            FeedEvent::UpToDate => log("application is up to date"),
            FeedEvent::UpdateAvailable { version } => {
                log(&format!("update {version} available; downloading"));
                if prompt.window_alive() {
                    prompt.notify_downloading(version);
                }
            }
            FeedEvent::Downloaded { version } => {
                log(&format!("update {version} downloaded"));
            }
            FeedEvent::Error { message } => {
                cycle_failed = true;
                log(&format!("update cycle failed: {message}"));
            }
            FeedEvent::DownloadProgress { .. } => {}
        }
        let next = runtime.snapshot().apply(&event);
        runtime.set_state(next);
    });

    let downloaded = match runtime.snapshot() {
        UpdateState::Downloaded(info) => info,
        UpdateState::Idle => {
            return if cycle_failed {
                CycleOutcome::Failed
            } else {
                CycleOutcome::UpToDate
            };
        }
        other => {
            log(&format!(
                "update cycle ended in unexpected state '{}'; resetting",
                other.label()
            ));
            runtime.set_state(UpdateState::Idle);
            return CycleOutcome::Failed;
        }
    };

    if prompt.window_alive() {
        // an interrupted dialog resolves as "later"
        if prompt.confirm_restart(&downloaded.version) == RestartChoice::Later {
            log(&format!(
                "update {} deferred; it installs when the application quits",
                downloaded.version
            ));
            runtime.set_state(UpdateState::Idle);
            return CycleOutcome::Deferred;
        }
    } else {
        log(&format!(
            "no window alive; installing update {} immediately",
            downloaded.version
        ));
    }

    match feed.install_downloaded() {
        Ok(()) => {
            log(&format!("update {} installed", downloaded.version));
            CycleOutcome::InstallRequested
        }
        Err(error) => {
            log(&format!("update install failed: {error}"));
            runtime.set_state(UpdateState::Idle);
            CycleOutcome::Failed
        }
    }
}

/// Starts the recurring cycle only when the enablement flag allows it; a
/// disabled orchestrator registers no timer and performs no network calls.
pub(crate) fn start_scheduler_if_enabled<F>(
    flags: UpdateFlags,
    initial_delay: Duration,
    period: Duration,
    tick: F,
) -> Option<UpdateScheduler>
where
    F: FnMut() + Send + 'static,
{
    if !flags.enabled {
        return None;
    }
    Some(UpdateScheduler::start(initial_delay, period, tick))
}

/// Wires the real feed, prompt, and scheduler together for the life of the
/// process. Returns `None` when the update channel is disabled.
pub(crate) fn spawn_update_loop(app_handle: &AppHandle) -> Option<UpdateScheduler> {
    let state = app_handle.state::<ShellState>();
    let flags = state.update.flags;
    if !flags.enabled {
        crate::append_update_log("update channel disabled; orchestrator not started");
        return None;
    }

    let feed = state
        .update_feed
        .get_or_init(|| Arc::new(UpdaterFeed::new(app_handle.clone())))
        .clone();
    let runtime = state.update.clone();
    let prompt = DialogPrompt {
        app_handle: app_handle.clone(),
        window_slot: state.window_slot.clone(),
    };
    let restart_handle = app_handle.clone();

    start_scheduler_if_enabled(flags, UPDATE_INITIAL_DELAY, UPDATE_CHECK_INTERVAL, move || {
        let outcome = run_cycle(&runtime, feed.as_ref(), &prompt, |message| {
            crate::append_update_log(message)
        });
        if outcome == CycleOutcome::InstallRequested {
            crate::append_update_log("requesting application restart");
            restart_handle.request_restart();
        }
    })
}

/// Auto-install-on-quit: a deferred downloaded artifact is installed while
/// the process exits, matching the enablement of the orchestrator itself.
pub(crate) fn install_deferred_update_on_quit(app_handle: &AppHandle) {
    let state = app_handle.state::<ShellState>();
    if !state.update.flags.enabled {
        return;
    }
    let Some(feed) = state.update_feed.get() else {
        return;
    };
    if !feed.has_downloaded_artifact() {
        return;
    }

    match feed.install_downloaded() {
        Ok(()) => crate::append_shutdown_log("deferred update installed during quit"),
        Err(error) => {
            crate::append_shutdown_log(&format!("deferred update install failed: {error}"))
        }
    }
}

/// Real prompt over the dialog plugin and the window slot.
pub(crate) struct DialogPrompt {
    pub(crate) app_handle: AppHandle,
    pub(crate) window_slot: Arc<WindowSlot>,
}

impl UpdatePrompt for DialogPrompt {
    fn window_alive(&self) -> bool {
        self.window_slot.is_alive()
    }

    fn notify_downloading(&self, version: &str) {
        self.app_handle
            .dialog()
            .message(format!(
                "EchoChat {version} is available and is downloading in the background."
            ))
            .title("Update available")
            .kind(MessageDialogKind::Info)
            .show(|_| {});
    }

    fn confirm_restart(&self, version: &str) -> RestartChoice {
        let restart_now = self
            .app_handle
            .dialog()
            .message(format!(
                "EchoChat {version} has been downloaded. Restart now to install it?\n\
                 Choosing \"No\" installs it the next time EchoChat closes."
            ))
            .title("Update ready")
            .kind(MessageDialogKind::Info)
            .buttons(MessageDialogButtons::YesNo)
            .blocking_show();

        if restart_now {
            RestartChoice::RestartNow
        } else {
            RestartChoice::Later
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    use super::{
        run_cycle, start_scheduler_if_enabled, CycleOutcome, RestartChoice, UpdatePrompt,
    };
    use crate::{
        update_feed::{FeedEvent, UpdateFeed},
        update_flags::UpdateFlags,
        update_state::UpdateState,
        AtomicFlagGuard, UpdateRuntime,
    };

    struct FakeFeed {
        script: Vec<FeedEvent>,
        checks: Cell<usize>,
        installs: Cell<usize>,
        artifact: Cell<bool>,
        install_result: Result<(), String>,
    }

    impl FakeFeed {
        fn scripted(script: Vec<FeedEvent>) -> Self {
            Self {
                script,
                checks: Cell::new(0),
                installs: Cell::new(0),
                artifact: Cell::new(false),
                install_result: Ok(()),
            }
        }

        fn downloading(version: &str) -> Self {
            Self::scripted(vec![
                FeedEvent::Checking,
                FeedEvent::UpdateAvailable {
                    version: version.to_string(),
                },
                FeedEvent::DownloadProgress { fraction: 0.5 },
                FeedEvent::Downloaded {
                    version: version.to_string(),
                },
            ])
        }
    }

    impl UpdateFeed for FakeFeed {
        fn run_check(&self, emit: &mut dyn FnMut(FeedEvent)) {
            self.checks.set(self.checks.get() + 1);
            for event in &self.script {
                if matches!(event, FeedEvent::Downloaded { .. }) {
                    self.artifact.set(true);
                }
                emit(event.clone());
            }
        }

        fn install_downloaded(&self) -> Result<(), String> {
            self.installs.set(self.installs.get() + 1);
            self.artifact.set(false);
            self.install_result.clone()
        }

        fn has_downloaded_artifact(&self) -> bool {
            self.artifact.get()
        }
    }

    struct FakePrompt {
        alive: bool,
        choice: RestartChoice,
        confirmations: RefCell<Vec<String>>,
        notices: RefCell<Vec<String>>,
    }

    impl FakePrompt {
        fn new(alive: bool, choice: RestartChoice) -> Self {
            Self {
                alive,
                choice,
                confirmations: RefCell::new(Vec::new()),
                notices: RefCell::new(Vec::new()),
            }
        }
    }

    impl UpdatePrompt for FakePrompt {
        fn window_alive(&self) -> bool {
            self.alive
        }

        fn notify_downloading(&self, version: &str) {
            self.notices.borrow_mut().push(version.to_string());
        }

        fn confirm_restart(&self, version: &str) -> RestartChoice {
            self.confirmations.borrow_mut().push(version.to_string());
            self.choice
        }
    }

    fn runtime() -> UpdateRuntime {
        UpdateRuntime::new(UpdateFlags::compute(true, true, false))
    }

    #[test]
    fn tick_while_cycle_in_flight_is_dropped_without_a_check() {
        let runtime = runtime();
        let feed = FakeFeed::downloading("2.0.0");
        let prompt = FakePrompt::new(true, RestartChoice::Later);

        let _in_flight =
            AtomicFlagGuard::try_set(&runtime.cycle_in_flight).expect("guard the cycle");
        let outcome = run_cycle(&runtime, &feed, &prompt, |_| {});

        assert_eq!(outcome, CycleOutcome::TickDropped);
        assert_eq!(feed.checks.get(), 0);
        assert!(runtime.snapshot().is_idle());
    }

    #[test]
    fn up_to_date_cycle_returns_to_idle_with_no_dialogs() {
        let runtime = runtime();
        let feed = FakeFeed::scripted(vec![FeedEvent::Checking, FeedEvent::UpToDate]);
        let prompt = FakePrompt::new(true, RestartChoice::Later);

        let outcome = run_cycle(&runtime, &feed, &prompt, |_| {});

        assert_eq!(outcome, CycleOutcome::UpToDate);
        assert!(runtime.snapshot().is_idle());
        assert!(prompt.confirmations.borrow().is_empty());
        assert!(prompt.notices.borrow().is_empty());
    }

    #[test]
    fn downloaded_with_live_window_issues_exactly_one_choice_dialog() {
        let runtime = runtime();
        let feed = FakeFeed::scripted(vec![
            FeedEvent::Checking,
            FeedEvent::UpdateAvailable {
                version: "2.0.0".to_string(),
            },
            FeedEvent::Downloaded {
                version: "2.0.0".to_string(),
            },
        ]);
        let prompt = FakePrompt::new(true, RestartChoice::Later);

        let outcome = run_cycle(&runtime, &feed, &prompt, |_| {});

        assert_eq!(outcome, CycleOutcome::Deferred);
        assert_eq!(prompt.confirmations.borrow().as_slice(), ["2.0.0"]);
        assert!(runtime.snapshot().is_idle());
        assert_eq!(feed.installs.get(), 0);
        assert!(feed.has_downloaded_artifact(), "deferred artifact is kept");
    }

    #[test]
    fn downloaded_with_no_window_installs_without_any_dialog() {
        let runtime = runtime();
        let feed = FakeFeed::downloading("2.1.0");
        let prompt = FakePrompt::new(false, RestartChoice::Later);

        let outcome = run_cycle(&runtime, &feed, &prompt, |_| {});

        assert_eq!(outcome, CycleOutcome::InstallRequested);
        assert_eq!(feed.installs.get(), 1);
        assert!(prompt.confirmations.borrow().is_empty());
        assert!(prompt.notices.borrow().is_empty());
    }

    #[test]
    fn restart_now_installs_after_the_dialog_resolves() {
        let runtime = runtime();
        let feed = FakeFeed::downloading("2.1.0");
        let prompt = FakePrompt::new(true, RestartChoice::RestartNow);

        let outcome = run_cycle(&runtime, &feed, &prompt, |_| {});

        assert_eq!(outcome, CycleOutcome::InstallRequested);
        assert_eq!(feed.installs.get(), 1);
        assert_eq!(prompt.confirmations.borrow().as_slice(), ["2.1.0"]);
        assert_eq!(prompt.notices.borrow().as_slice(), ["2.1.0"]);
    }

    #[test]
    fn check_error_logs_and_returns_to_idle() {
        let runtime = runtime();
        let feed = FakeFeed::scripted(vec![
            FeedEvent::Checking,
            FeedEvent::Error {
                message: "feed unreachable".to_string(),
            },
        ]);
        let prompt = FakePrompt::new(true, RestartChoice::Later);
        let logged = RefCell::new(Vec::new());

        let outcome = run_cycle(&runtime, &feed, &prompt, |message| {
            logged.borrow_mut().push(message.to_string());
        });

        assert_eq!(outcome, CycleOutcome::Failed);
        assert!(runtime.snapshot().is_idle());
        assert!(logged
            .borrow()
            .iter()
            .any(|line| line.contains("feed unreachable")));
        assert!(prompt.confirmations.borrow().is_empty());
    }

    #[test]
    fn install_failure_resets_state_for_the_next_tick() {
        let runtime = runtime();
        let mut feed = FakeFeed::downloading("2.1.0");
        feed.install_result = Err("installer exited with status 1".to_string());
        let prompt = FakePrompt::new(false, RestartChoice::Later);

        let outcome = run_cycle(&runtime, &feed, &prompt, |_| {});

        assert_eq!(outcome, CycleOutcome::Failed);
        assert!(runtime.snapshot().is_idle());
    }

    #[test]
    fn consecutive_cycles_run_once_the_previous_one_settled() {
        let runtime = runtime();
        let feed = FakeFeed::scripted(vec![FeedEvent::Checking, FeedEvent::UpToDate]);
        let prompt = FakePrompt::new(true, RestartChoice::Later);

        assert_eq!(
            run_cycle(&runtime, &feed, &prompt, |_| {}),
            CycleOutcome::UpToDate
        );
        assert_eq!(
            run_cycle(&runtime, &feed, &prompt, |_| {}),
            CycleOutcome::UpToDate
        );
        assert_eq!(feed.checks.get(), 2);
    }

    #[test]
    fn mid_cycle_state_tracks_download_progress() {
        let runtime = runtime();
        let feed = FakeFeed::downloading("2.2.0");
        let prompt = FakePrompt::new(false, RestartChoice::Later);
        let states = RefCell::new(Vec::new());

        // observe states through the log closure, which fires per event
        let _ = run_cycle(&runtime, &feed, &prompt, |_| {
            states.borrow_mut().push(runtime.snapshot().label());
        });

        assert!(states.borrow().contains(&"checking"));
    }

    #[test]
    fn disabled_flags_register_no_scheduler_and_no_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let tick_counter = ticks.clone();

        let scheduler = start_scheduler_if_enabled(
            UpdateFlags::compute(true, false, false),
            Duration::from_millis(1),
            Duration::from_millis(2),
            move || {
                tick_counter.fetch_add(1, Ordering::Relaxed);
            },
        );

        assert!(scheduler.is_none());
        thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn enabled_flags_register_a_scheduler() {
        let scheduler = start_scheduler_if_enabled(
            UpdateFlags::compute(true, true, false),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            || {},
        );
        assert!(scheduler.is_some());
    }

    #[test]
    fn downloaded_state_is_reached_before_settlement() {
        let runtime = runtime();
        let feed = FakeFeed::downloading("2.0.0");
        let prompt = FakePrompt::new(true, RestartChoice::Later);

        let _ = run_cycle(&runtime, &feed, &prompt, |_| {});

        // after a deferred settlement the cycle is idle again
        assert_eq!(runtime.snapshot(), UpdateState::Idle);
    }
}
