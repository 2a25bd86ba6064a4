//! The authoritative list of counted lines and its durable copy.

pub mod csv;
pub mod export;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};

use crate::models::{ScanRecord, StoredRecord};
use crate::storage::SlotStore;

pub use export::ExportFile;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("No items to export.")]
    NothingToExport,
}

struct LedgerInner {
    records: Mutex<Vec<ScanRecord>>,
    store: Arc<dyn SlotStore>,
    key: String,
    revision: watch::Sender<u64>,
}

/// Append-only record list, persisted as JSON under one storage slot after
/// every mutation.
///
/// Storage failures are logged and swallowed: the in-memory list stays the
/// source of truth for the session.
#[derive(Clone)]
pub struct Ledger {
    inner: Arc<LedgerInner>,
}

impl Ledger {
    /// Reads the saved list. Absent, unreadable and unparsable slots all start
    /// an empty ledger; individual entries that break record invariants are
    /// dropped and the rest kept.
    pub async fn load(store: Arc<dyn SlotStore>, key: impl Into<String>) -> Self {
        let key = key.into();

        let records = match store.read(&key).await {
            Ok(Some(raw)) => match decode_records(&raw) {
                Ok(records) => {
                    log_info!("Loaded {} saved line(s) from slot {key}", records.len());
                    records
                }
                Err(err) => {
                    log_error!("Error loading saved items from slot {key}: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                log_error!("Error reading slot {key}: {err:?}");
                Vec::new()
            }
        };

        let (revision, _) = watch::channel(0);

        Self {
            inner: Arc::new(LedgerInner {
                records: Mutex::new(records),
                store,
                key,
                revision,
            }),
        }
    }

    pub async fn records(&self) -> Vec<ScanRecord> {
        self.inner.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.records.lock().await.is_empty()
    }

    /// Adds a line at the end and returns the new length.
    pub async fn append(&self, record: ScanRecord) -> usize {
        let mut records = self.inner.records.lock().await;
        records.push(record);
        self.persist(&records).await;
        let len = records.len();
        drop(records);

        self.notify();
        len
    }

    /// Drops every line. Callers are responsible for having asked the user.
    pub async fn clear(&self) {
        let mut records = self.inner.records.lock().await;
        let dropped = records.len();
        records.clear();
        self.persist(&records).await;
        drop(records);

        log_info!("Cleared {dropped} line(s)");
        self.notify();
    }

    pub async fn to_csv(&self) -> Result<String, LedgerError> {
        let records = self.inner.records.lock().await;
        if records.is_empty() {
            return Err(LedgerError::NothingToExport);
        }
        Ok(csv::render(&records))
    }

    pub async fn export(&self, now: DateTime<Utc>) -> Result<ExportFile, LedgerError> {
        let contents = self.to_csv().await?;
        Ok(ExportFile::csv(contents, now))
    }

    /// Revision counter that bumps after every append or clear.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn notify(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    async fn persist(&self, records: &[ScanRecord]) {
        let serialized = match serde_json::to_string(records) {
            Ok(serialized) => serialized,
            Err(err) => {
                log_error!("Error serializing items: {err}");
                return;
            }
        };

        if let Err(err) = self.inner.store.write(&self.inner.key, &serialized).await {
            log_error!("Error saving items to slot {}: {err:?}", self.inner.key);
        }
    }
}

fn decode_records(raw: &str) -> Result<Vec<ScanRecord>, serde_json::Error> {
    // Shape is checked per entry so one malformed line cannot sink the rest.
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let total = entries.len();

    let records: Vec<ScanRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let decoded = serde_json::from_value::<StoredRecord>(entry)
                .map_err(|err| err.to_string())
                .and_then(ScanRecord::try_from);
            match decoded {
                Ok(record) => Some(record),
                Err(reason) => {
                    log_warn!("Dropping saved line {}: {reason}", index + 1);
                    None
                }
            }
        })
        .collect();

    if records.len() != total {
        log_warn!("Kept {} of {total} saved line(s)", records.len());
    }
    Ok(records)
}
