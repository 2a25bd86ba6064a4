use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use tokio::sync::Mutex;

use crate::ledger::Ledger;
use crate::models::{RecordError, ScanRecord};

use super::form::{EntryField, EntrySnapshot, PendingEntry};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntryError {
    #[error("Barcode is required.")]
    MissingBarcode,
    #[error("Quantity is required.")]
    MissingQuantity,
    #[error("Quantity must be a valid number.")]
    InvalidQuantity,
}

impl From<RecordError> for EntryError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::EmptyBarcode | RecordError::UntrimmedBarcode => EntryError::MissingBarcode,
            RecordError::InvalidQuantity(_) => EntryError::InvalidQuantity,
        }
    }
}

/// Trimmed, type-checked form contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub barcode: String,
    pub quantity: f64,
    pub uom: String,
    pub location: String,
}

impl ValidEntry {
    pub fn into_record(self, timestamp: DateTime<Utc>) -> Result<ScanRecord, RecordError> {
        ScanRecord::new(
            timestamp,
            self.barcode,
            self.quantity,
            self.uom,
            self.location,
        )
    }
}

/// Checks the form in the order the user reads it: barcode, then quantity.
pub fn validate(form: &PendingEntry) -> Result<ValidEntry, EntryError> {
    let barcode = form.barcode.trim();
    if barcode.is_empty() {
        return Err(EntryError::MissingBarcode);
    }

    let quantity = form.quantity.trim();
    if quantity.is_empty() {
        return Err(EntryError::MissingQuantity);
    }

    let quantity = match quantity.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => return Err(EntryError::InvalidQuantity),
    };

    Ok(ValidEntry {
        barcode: barcode.to_string(),
        quantity,
        uom: form.uom.trim().to_string(),
        location: form.location.trim().to_string(),
    })
}

/// Bridges scanner and form input to ledger appends.
#[derive(Clone)]
pub struct EntryController {
    state: Arc<Mutex<EntrySnapshot>>,
    ledger: Ledger,
}

impl EntryController {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            state: Arc::new(Mutex::new(EntrySnapshot::default())),
            ledger,
        }
    }

    pub async fn snapshot(&self) -> EntrySnapshot {
        self.state.lock().await.clone()
    }

    /// Drops a scanned value into the barcode field and moves focus to
    /// quantity. Nothing is recorded until the user submits.
    pub async fn populate_from_scan(&self, value: &str) -> EntrySnapshot {
        let mut state = self.state.lock().await;
        state.form.barcode = value.to_string();
        state.focus = EntryField::Quantity;
        state.clone()
    }

    /// Mirrors what the user has typed so far.
    pub async fn replace_form(&self, form: PendingEntry) -> EntrySnapshot {
        let mut state = self.state.lock().await;
        state.form = form;
        state.clone()
    }

    pub async fn submit(&self) -> Result<(ScanRecord, EntrySnapshot), EntryError> {
        self.submit_at(Utc::now()).await
    }

    /// Validates the pending form and appends a record stamped `now`.
    ///
    /// On success the tally fields are cleared and the barcode kept, so the
    /// next quantity of the same item needs no rescan. On failure neither the
    /// form nor the ledger changes.
    pub async fn submit_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(ScanRecord, EntrySnapshot), EntryError> {
        let mut state = self.state.lock().await;

        let record = validate(&state.form)?.into_record(now)?;
        let len = self.ledger.append(record.clone()).await;
        info!(
            "Recorded {} x {} (line {len})",
            record.barcode(),
            record.quantity()
        );

        state.form.clear_tally();
        state.focus = EntryField::Quantity;
        Ok((record, state.clone()))
    }

    /// Empties all four fields, barcode included.
    pub async fn clear_current(&self) -> EntrySnapshot {
        let mut state = self.state.lock().await;
        state.form.clear_all();
        state.focus = EntryField::Barcode;
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlotStore;
    use chrono::TimeZone;

    fn form(barcode: &str, quantity: &str, uom: &str, location: &str) -> PendingEntry {
        PendingEntry {
            barcode: barcode.into(),
            quantity: quantity.into(),
            uom: uom.into(),
            location: location.into(),
        }
    }

    async fn controller() -> (EntryController, Ledger) {
        let ledger = Ledger::load(Arc::new(MemorySlotStore::new()), "items").await;
        (EntryController::new(ledger.clone()), ledger)
    }

    #[test]
    fn validate_trims_every_field() {
        let entry = validate(&form("  012345678905 ", " 3 ", " ea ", "\tA1 ")).unwrap();
        assert_eq!(
            entry,
            ValidEntry {
                barcode: "012345678905".into(),
                quantity: 3.0,
                uom: "ea".into(),
                location: "A1".into(),
            }
        );
    }

    #[test]
    fn validate_names_the_failing_field() {
        assert_eq!(validate(&form("", "5", "", "")), Err(EntryError::MissingBarcode));
        assert_eq!(validate(&form("   ", "5", "", "")), Err(EntryError::MissingBarcode));
        assert_eq!(validate(&form("1", "", "", "")), Err(EntryError::MissingQuantity));
        assert_eq!(validate(&form("1", "  ", "", "")), Err(EntryError::MissingQuantity));
        for bad in ["abc", "-1", "1,5", "NaN", "inf", "-infinity"] {
            assert_eq!(
                validate(&form("1", bad, "", "")),
                Err(EntryError::InvalidQuantity),
                "quantity {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn validate_accepts_fractional_and_zero() {
        assert_eq!(validate(&form("1", "0", "", "")).unwrap().quantity, 0.0);
        assert_eq!(validate(&form("1", "2.75", "", "")).unwrap().quantity, 2.75);
        assert_eq!(validate(&form("1", "1e2", "", "")).unwrap().quantity, 100.0);
    }

    #[test]
    fn missing_barcode_message_is_user_facing() {
        assert_eq!(EntryError::MissingBarcode.to_string(), "Barcode is required.");
    }

    #[tokio::test]
    async fn scan_populates_barcode_without_recording() {
        let (entry, ledger) = controller().await;
        entry.replace_form(form("", "", "ea", "")).await;

        let snapshot = entry.populate_from_scan("4006381333931").await;

        assert_eq!(snapshot.form.barcode, "4006381333931");
        assert_eq!(snapshot.form.uom, "ea");
        assert_eq!(snapshot.focus, EntryField::Quantity);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn submit_appends_trimmed_record_and_keeps_barcode() {
        let (entry, ledger) = controller().await;
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap();
        entry
            .replace_form(form(" 012345678905 ", "3", "ea", "A1"))
            .await;

        let (record, snapshot) = entry.submit_at(now).await.unwrap();

        assert_eq!(record.barcode(), "012345678905");
        assert_eq!(record.quantity(), 3.0);
        assert_eq!(record.timestamp(), now);
        assert_eq!(ledger.records().await, vec![record]);
        assert_eq!(snapshot.form, form(" 012345678905 ", "", "", ""));
        assert_eq!(snapshot.focus, EntryField::Quantity);
    }

    #[tokio::test]
    async fn rejected_submit_changes_nothing() {
        let (entry, ledger) = controller().await;
        entry.replace_form(form("", "5", "", "B2")).await;

        assert_eq!(entry.submit().await.unwrap_err(), EntryError::MissingBarcode);
        assert!(ledger.is_empty().await);
        assert_eq!(entry.snapshot().await.form, form("", "5", "", "B2"));
    }

    #[tokio::test]
    async fn clear_current_empties_barcode_too() {
        let (entry, _ledger) = controller().await;
        entry.replace_form(form("1", "2", "ea", "A1")).await;

        let snapshot = entry.clear_current().await;

        assert_eq!(snapshot.form, PendingEntry::default());
        assert_eq!(snapshot.focus, EntryField::Barcode);
    }
}
