pub mod app;
pub mod capture;
pub mod entry;
pub mod ledger;
pub mod models;
pub mod settings;
pub mod storage;
mod utils;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
pub(crate) struct AppState {
    pub(crate) core: app::ShelfScanner,
    pub(crate) settings: settings::SettingsStore,
}

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Arc;

    use log::warn;
    use tauri::{AppHandle, Emitter, Manager};

    use crate::{
        app::{ShelfScanner, UiEvent},
        capture::Capabilities,
        commands::{
            clear_entry, clear_ledger, export_csv, get_entry, get_ledger, get_scanner_status,
            start_scanning, stop_scanning, submit_entry, update_entry,
        },
        settings::SettingsStore,
        storage::{Database, MemorySlotStore, SlotStore},
        AppState,
    };

    fn emit_ui_event(app_handle: &AppHandle, event: UiEvent) {
        let result = match event {
            UiEvent::LedgerChanged(records) => app_handle.emit("ledger-changed", records),
            UiEvent::EntryChanged(snapshot) => app_handle.emit("entry-changed", snapshot),
            UiEvent::ScannerChanged(status) => app_handle.emit("scanner-status-changed", status),
        };

        if let Err(err) = result {
            warn!("failed to emit UI event: {err}");
        }
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        // Initialize logging (reads RUST_LOG env var, defaults to info)
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();

        log::info!("Shelf Scanner starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;
                    let settings = settings_store.settings();

                    let db_path = app_data_dir.join("shelf_scanner.sqlite3");
                    let store: Arc<dyn SlotStore> = match Database::new(db_path) {
                        Ok(database) => Arc::new(database),
                        Err(err) => {
                            warn!("Storage unavailable, this session will not be saved: {err:?}");
                            Arc::new(MemorySlotStore::new())
                        }
                    };

                    // No native camera or decoder is bundled; the UI offers manual entry.
                    let (core, mut events) = tauri::async_runtime::block_on(
                        ShelfScanner::start(store, &settings, Capabilities::none()),
                    );

                    let app_handle = app.handle().clone();
                    tauri::async_runtime::spawn(async move {
                        while let Some(event) = events.recv().await {
                            emit_ui_event(&app_handle, event);
                        }
                    });

                    app.manage(AppState {
                        core,
                        settings: settings_store,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                get_ledger,
                get_entry,
                update_entry,
                submit_entry,
                clear_entry,
                clear_ledger,
                export_csv,
                get_scanner_status,
                start_scanning,
                stop_scanning,
            ])
            .build(tauri::generate_context!())
            .expect("error while building tauri application")
            .run(|app_handle, event| {
                // Release the camera on the way out, same path as the stop button
                if let tauri::RunEvent::Exit = event {
                    if let Some(state) = app_handle.try_state::<AppState>() {
                        tauri::async_runtime::block_on(state.core.shutdown());
                    }
                }
            });
    }
}
