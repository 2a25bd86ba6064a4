//! Wires the ledger, the entry form and the scanner together and turns their
//! changes into events for whatever renders them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::capture::{Capabilities, ScanDetection, ScanError, ScannerController, ScannerStatus};
use crate::entry::{EntryController, EntryError, EntrySnapshot, PendingEntry};
use crate::ledger::{ExportFile, Ledger, LedgerError};
use crate::models::ScanRecord;
use crate::settings::ScannerSettings;
use crate::storage::SlotStore;

/// Detections waiting for the pump; a full queue holds the capture loop back.
const DETECTION_QUEUE: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    LedgerChanged(Vec<ScanRecord>),
    EntryChanged(EntrySnapshot),
    ScannerChanged(ScannerStatus),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Clearing all scanned lines needs confirmation.")]
    ClearNotConfirmed,
}

#[derive(Clone)]
pub struct ShelfScanner {
    ledger: Ledger,
    entry: EntryController,
    scanner: ScannerController,
    shutdown: CancellationToken,
}

impl ShelfScanner {
    /// Loads the saved ledger and starts the event pump. Scanning itself stays
    /// off until `start_scanning`.
    pub async fn start(
        store: Arc<dyn SlotStore>,
        settings: &ScannerSettings,
        capabilities: Capabilities,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let ledger = Ledger::load(store, settings.storage_key.clone()).await;
        let entry = EntryController::new(ledger.clone());

        let (detection_tx, detection_rx) = mpsc::channel(DETECTION_QUEUE);
        let scanner =
            ScannerController::new(capabilities, settings.capture_config(), detection_tx);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        tokio::spawn(pump_events(
            detection_rx,
            ledger.subscribe(),
            scanner.subscribe(),
            ledger.clone(),
            entry.clone(),
            scanner.clone(),
            event_tx,
            shutdown.clone(),
        ));

        info!(
            "Shelf scanner ready ({} saved line(s), camera scanning {})",
            ledger.len().await,
            if scanner.status().detector_available {
                "available"
            } else {
                "unavailable"
            }
        );

        (
            Self {
                ledger,
                entry,
                scanner,
                shutdown,
            },
            event_rx,
        )
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn entry(&self) -> &EntryController {
        &self.entry
    }

    pub fn scanner(&self) -> &ScannerController {
        &self.scanner
    }

    /// Keeps the backend copy of the form in step with what the user types, so
    /// a scan arriving mid-entry only touches the barcode.
    pub async fn update_entry(&self, form: PendingEntry) -> EntrySnapshot {
        self.entry.replace_form(form).await
    }

    /// Takes the form as currently shown and records it.
    pub async fn submit(&self, form: PendingEntry) -> Result<EntrySnapshot, EntryError> {
        self.entry.replace_form(form).await;
        let (_, snapshot) = self.entry.submit().await?;
        Ok(snapshot)
    }

    pub async fn clear_entry(&self) -> EntrySnapshot {
        self.entry.clear_current().await
    }

    /// Irreversible; refused unless the user confirmed.
    pub async fn clear_all(&self, confirmed: bool) -> Result<(), AppError> {
        if !confirmed {
            return Err(AppError::ClearNotConfirmed);
        }
        self.ledger.clear().await;
        Ok(())
    }

    pub async fn export(&self, now: DateTime<Utc>) -> Result<ExportFile, LedgerError> {
        self.ledger.export(now).await
    }

    pub async fn start_scanning(&self) -> Result<ScannerStatus, ScanError> {
        self.scanner.start().await?;
        Ok(self.scanner.status())
    }

    pub async fn stop_scanning(&self) -> ScannerStatus {
        self.scanner.stop().await;
        self.scanner.status()
    }

    /// Teardown path: releases the camera like an explicit stop, then ends the
    /// event pump.
    pub async fn shutdown(&self) {
        self.scanner.stop().await;
        self.shutdown.cancel();
    }
}

#[allow(clippy::too_many_arguments)]
async fn pump_events(
    mut detections: mpsc::Receiver<ScanDetection>,
    mut ledger_changes: watch::Receiver<u64>,
    mut status_changes: watch::Receiver<ScannerStatus>,
    ledger: Ledger,
    entry: EntryController,
    scanner: ScannerController,
    events: mpsc::UnboundedSender<UiEvent>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(detection) = detections.recv() => {
                let snapshot = entry.populate_from_scan(&detection.value).await;
                scanner.note_detection(&detection.value);
                UiEvent::EntryChanged(snapshot)
            }
            Ok(()) = ledger_changes.changed() => {
                UiEvent::LedgerChanged(ledger.records().await)
            }
            Ok(()) = status_changes.changed() => {
                UiEvent::ScannerChanged(status_changes.borrow_and_update().clone())
            }
            else => break,
        };

        if events.send(event).is_err() {
            warn!("UI event receiver dropped; event pump exiting");
            break;
        }
    }
}
