use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

/// Recurring tick loop on a dedicated thread. Stopping is cooperative: the
/// stop flag is checked at every wakeup, so a stop takes effect within one
/// sleep slice rather than one full period.
pub(crate) struct UpdateScheduler {
    stop: Arc<AtomicBool>,
}

const SLEEP_SLICE: Duration = Duration::from_millis(200);

impl UpdateScheduler {
    pub(crate) fn start<F>(initial_delay: Duration, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        thread::spawn(move || {
            if !sleep_unless_stopped(&thread_stop, initial_delay) {
                return;
            }
            loop {
                tick();
                if !sleep_unless_stopped(&thread_stop, period) {
                    return;
                }
            }
        });
        Self { stop }
    }

    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sleep_unless_stopped(stop: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return !stop.load(Ordering::Relaxed);
        }
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}
