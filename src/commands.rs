use chrono::Utc;
use log::warn;
use tauri::{AppHandle, Manager, State};
use tauri_plugin_opener::OpenerExt;

use crate::{
    capture::ScannerStatus,
    entry::{EntrySnapshot, PendingEntry},
    models::ScanRecord,
    AppState,
};

#[tauri::command]
pub async fn get_ledger(state: State<'_, AppState>) -> Result<Vec<ScanRecord>, String> {
    Ok(state.core.ledger().records().await)
}

#[tauri::command]
pub async fn get_entry(state: State<'_, AppState>) -> Result<EntrySnapshot, String> {
    Ok(state.core.entry().snapshot().await)
}

#[tauri::command]
pub async fn update_entry(
    state: State<'_, AppState>,
    form: PendingEntry,
) -> Result<EntrySnapshot, String> {
    Ok(state.core.update_entry(form).await)
}

#[tauri::command]
pub async fn submit_entry(
    state: State<'_, AppState>,
    form: PendingEntry,
) -> Result<EntrySnapshot, String> {
    state.core.submit(form).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_entry(state: State<'_, AppState>) -> Result<EntrySnapshot, String> {
    Ok(state.core.clear_entry().await)
}

#[tauri::command]
pub async fn clear_ledger(state: State<'_, AppState>, confirmed: bool) -> Result<(), String> {
    state
        .core
        .clear_all(confirmed)
        .await
        .map_err(|e| e.to_string())
}

/// Writes the CSV into the export folder and returns its path.
#[tauri::command]
pub async fn export_csv(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let file = state
        .core
        .export(Utc::now())
        .await
        .map_err(|e| e.to_string())?;

    let dir = match state.settings.settings().export_dir {
        Some(dir) => dir,
        None => app_handle.path().download_dir().map_err(|e| e.to_string())?,
    };
    let path = file.write_to(&dir).map_err(|e| e.to_string())?;

    if let Err(err) = app_handle.opener().reveal_item_in_dir(&path) {
        warn!("Could not reveal {}: {err}", path.display());
    }

    Ok(path.display().to_string())
}

#[tauri::command]
pub async fn get_scanner_status(state: State<'_, AppState>) -> Result<ScannerStatus, String> {
    Ok(state.core.scanner().status())
}

#[tauri::command]
pub async fn start_scanning(state: State<'_, AppState>) -> Result<ScannerStatus, String> {
    state
        .core
        .start_scanning()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_scanning(state: State<'_, AppState>) -> Result<ScannerStatus, String> {
    Ok(state.core.stop_scanning().await)
}
