use tauri::{webview::PageLoadEvent, Manager, RunEvent};

use crate::{
    append_desktop_log, append_shutdown_log, append_startup_log, logging, runtime_paths,
    startup_task, update_orchestrator, window_lifecycle, ShellState, DESKTOP_LOG_FILE,
};

pub(crate) fn run() {
    append_startup_log("desktop process starting");
    append_startup_log(&format!(
        "desktop log path: {}",
        logging::resolve_desktop_log_path(
            runtime_paths::default_app_root_dir(),
            DESKTOP_LOG_FILE,
        )
        .display()
    ));

    let shell_state = ShellState::from_environment();
    append_startup_log(&format!(
        "backend candidates: {}",
        shell_state.candidates.join(", ")
    ));
    if !shell_state.update.flags.enabled {
        append_startup_log("update channel disabled for this build or platform");
    }

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, _args, _cwd| {
            append_desktop_log("second instance launch; focusing existing window");
            window_lifecycle::focus_main_window(app_handle, append_desktop_log);
        }))
        .plugin(tauri_plugin_process::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .manage(shell_state)
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::desktop_bridge_is_desktop_runtime,
            crate::desktop_bridge_commands::desktop_bridge_get_update_state,
            crate::desktop_bridge_commands::desktop_bridge_open_external_url,
            crate::desktop_bridge_commands::desktop_bridge_check_app_update,
            crate::desktop_bridge_commands::desktop_bridge_install_app_update,
        ])
        .on_page_load(|_webview, payload| match payload.event() {
            PageLoadEvent::Started => {
                append_desktop_log(&format!("page-load started: {}", payload.url()));
            }
            PageLoadEvent::Finished => {
                append_desktop_log(&format!("page-load finished: {}", payload.url()));
            }
        })
        .setup(|app| {
            let app_handle = app.handle().clone();
            startup_task::spawn_startup_task(app_handle.clone(), append_startup_log);

            let scheduler = update_orchestrator::spawn_update_loop(&app_handle);
            let state = app.state::<ShellState>();
            match state.update_scheduler.lock() {
                Ok(mut guard) => *guard = scheduler,
                Err(poisoned) => *poisoned.into_inner() = scheduler,
            }
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { api, code, .. } => {
                // desktop-shell convention: stay resident on macOS after the
                // last window closes; explicit exits carry a code
                if code.is_none() && cfg!(target_os = "macos") {
                    api.prevent_exit();
                }
            }
            RunEvent::Exit => {
                update_orchestrator::install_deferred_update_on_quit(app_handle);
                append_shutdown_log("desktop process exiting");
            }
            _ => {}
        });
}
