//! The single line item of a count: one scanned (or typed) barcode with its tally.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Barcode is required.")]
    EmptyBarcode,
    #[error("Barcode must not carry leading or trailing whitespace.")]
    UntrimmedBarcode,
    #[error("Quantity must be a finite number of zero or more (got {0}).")]
    InvalidQuantity(f64),
}

/// An immutable ledger line.
///
/// `ScanRecord::new` is the only constructor, so a value of this type always
/// satisfies the ledger invariants: barcode non-empty and trimmed, quantity
/// finite and not negative. `uom` and `location` are empty strings when the
/// user left them blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord", into = "StoredRecord")]
pub struct ScanRecord {
    timestamp: DateTime<Utc>,
    barcode: String,
    quantity: f64,
    uom: String,
    location: String,
}

impl ScanRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        barcode: impl Into<String>,
        quantity: f64,
        uom: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let barcode = barcode.into();
        if barcode.trim().is_empty() {
            return Err(RecordError::EmptyBarcode);
        }
        if barcode.trim() != barcode {
            return Err(RecordError::UntrimmedBarcode);
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(RecordError::InvalidQuantity(quantity));
        }

        Ok(Self {
            // storage keeps milliseconds; truncating here keeps reloads lossless
            timestamp: timestamp.trunc_subsecs(3),
            barcode,
            // -0.0 passes the sign check but would print as "-0"
            quantity: if quantity == 0.0 { 0.0 } else { quantity },
            uom: uom.into(),
            location: location.into(),
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Creation instant as stored and exported, e.g. `2024-05-01T09:30:12.345Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn uom(&self) -> &str {
        &self.uom
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Storage shape of a record: the JSON object kept in the persistent slot.
///
/// Older lists may omit `uom`/`location` or store them as `null`; both read
/// back as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub timestamp: String,
    pub barcode: String,
    pub quantity: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uom: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<ScanRecord> for StoredRecord {
    fn from(record: ScanRecord) -> Self {
        Self {
            timestamp: record.timestamp_iso(),
            barcode: record.barcode,
            quantity: record.quantity,
            uom: record.uom,
            location: record.location,
        }
    }
}

impl TryFrom<StoredRecord> for ScanRecord {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&stored.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| format!("invalid timestamp '{}': {err}", stored.timestamp))?;

        ScanRecord::new(
            timestamp,
            stored.barcode,
            stored.quantity,
            stored.uom,
            stored.location,
        )
        .map_err(|err| err.to_string())
    }
}
