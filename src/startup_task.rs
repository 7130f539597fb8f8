use std::{env, thread};

use tauri::{AppHandle, Manager};

use crate::{
    endpoint_resolver::{self, ResolveTiming},
    probe_http, startup_error,
    startup_error::StartupFailure,
    update_flags,
    window_lifecycle, ShellState, DEVTOOLS_ENV, PROBE_CONNECT_TIMEOUT,
};

/// Bootstrap: resolve a reachable backend endpoint, then create the main
/// window pointed at it. Runs off the main thread because resolution can
/// block for the full candidate-list deadline; window creation is dispatched
/// back to the main thread. Any failure on this path is fatal.
pub(crate) fn spawn_startup_task<L>(app_handle: AppHandle, log: L)
where
    L: Fn(&str) + Send + 'static,
{
    thread::spawn(move || {
        let state = app_handle.state::<ShellState>();
        let timing = ResolveTiming::from_environment();
        log(&format!(
            "resolving backend endpoint from {} candidate(s), {}ms per candidate",
            state.candidates.len(),
            timing.per_candidate_timeout.as_millis()
        ));

        let resolved = endpoint_resolver::resolve_backend_endpoint(
            &state.candidates,
            timing,
            |candidate| probe_http::probe_endpoint(candidate, PROBE_CONNECT_TIMEOUT),
            |interval| thread::sleep(interval),
            &log,
        );
        let backend_url = match resolved {
            Ok(url) => url,
            Err(failure) => {
                startup_error::handle_startup_failure(&app_handle, &failure);
                return;
            }
        };
        log(&format!("backend endpoint resolved: {backend_url}"));

        let open_devtools = devtools_requested();
        let creation_handle = app_handle.clone();
        let dispatched = app_handle.run_on_main_thread(move || {
            if let Err(failure) =
                window_lifecycle::create_main_window(&creation_handle, &backend_url, open_devtools)
            {
                startup_error::handle_startup_failure(&creation_handle, &failure);
            }
        });
        if let Err(error) = dispatched {
            startup_error::handle_startup_failure(
                &app_handle,
                &StartupFailure::WindowCreation(format!(
                    "failed to dispatch window creation to the main thread: {error}"
                )),
            );
        }
    });
}

fn devtools_requested() -> bool {
    env::var(DEVTOOLS_ENV)
        .map(|value| update_flags::flag_enabled(&value))
        .unwrap_or(false)
}
