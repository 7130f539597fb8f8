use std::sync::Mutex;

use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder, WindowEvent};
use url::Url;

use crate::{startup_error::StartupFailure, ShellState, MAIN_WINDOW_LABEL, MAIN_WINDOW_TITLE};

/// Owner of the single live window reference. Installing returns a
/// generation token; releasing clears the slot only while that token is
/// still the current one, so a stale close signal arriving after a newer
/// window replaced it cannot clear the wrong handle.
#[derive(Debug, Default)]
pub(crate) struct WindowSlot {
    current: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    live_generation: Option<u64>,
    next_generation: u64,
}

impl WindowSlot {
    pub(crate) fn install(&self) -> u64 {
        let mut state = self.lock_state();
        state.next_generation += 1;
        let generation = state.next_generation;
        state.live_generation = Some(generation);
        generation
    }

    pub(crate) fn release(&self, generation: u64) -> bool {
        let mut state = self.lock_state();
        if state.live_generation == Some(generation) {
            state.live_generation = None;
            return true;
        }
        false
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.lock_state().live_generation.is_some()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SlotState> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Creates the main window pointed at the resolved backend URL. Called only
/// after resolution succeeds; any failure here is fatal and propagates to
/// the startup error handler.
pub(crate) fn create_main_window(
    app_handle: &AppHandle,
    backend_url: &str,
    open_devtools: bool,
) -> Result<(), StartupFailure> {
    let parsed = Url::parse(backend_url).map_err(|error| {
        StartupFailure::WindowCreation(format!("invalid backend URL {backend_url}: {error}"))
    })?;

    let window = WebviewWindowBuilder::new(
        app_handle,
        MAIN_WINDOW_LABEL,
        WebviewUrl::External(parsed),
    )
    .title(MAIN_WINDOW_TITLE)
    .inner_size(1280.0, 800.0)
    .min_inner_size(940.0, 600.0)
    .build()
    .map_err(|error| StartupFailure::WindowCreation(error.to_string()))?;

    let state = app_handle.state::<ShellState>();
    let slot = state.window_slot.clone();
    let generation = slot.install();
    window.on_window_event(move |event| {
        if matches!(event, WindowEvent::Destroyed) && slot.release(generation) {
            crate::append_desktop_log("main window destroyed; window slot cleared");
        }
    });

    if open_devtools {
        window.open_devtools();
    }

    Ok(())
}

/// Second-launch behavior: surface the existing main window instead of
/// creating another one.
pub(crate) fn focus_main_window<L>(app_handle: &AppHandle, log: L)
where
    L: Fn(&str),
{
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        log("focus skipped: main window not found");
        return;
    };
    if let Err(error) = window.show() {
        log(&format!("failed to show main window: {error}"));
    }
    if let Err(error) = window.set_focus() {
        log(&format!("failed to focus main window: {error}"));
    }
}

#[cfg(test)]
mod tests {
    use super::WindowSlot;

    #[test]
    fn install_then_release_clears_the_slot() {
        let slot = WindowSlot::default();
        assert!(!slot.is_alive());

        let generation = slot.install();
        assert!(slot.is_alive());

        assert!(slot.release(generation));
        assert!(!slot.is_alive());
    }

    #[test]
    fn stale_release_does_not_clear_a_newer_window() {
        let slot = WindowSlot::default();
        let first = slot.install();
        let second = slot.install();

        assert!(!slot.release(first));
        assert!(slot.is_alive());

        assert!(slot.release(second));
        assert!(!slot.is_alive());
    }

    #[test]
    fn release_is_idempotent_per_generation() {
        let slot = WindowSlot::default();
        let generation = slot.install();

        assert!(slot.release(generation));
        assert!(!slot.release(generation));
        assert!(!slot.is_alive());
    }
}
