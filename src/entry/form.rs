use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum EntryField {
    #[default]
    Barcode,
    Quantity,
    Uom,
    Location,
}

/// The four form fields exactly as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PendingEntry {
    pub barcode: String,
    pub quantity: String,
    pub uom: String,
    pub location: String,
}

impl PendingEntry {
    /// Clears the tally fields and keeps the barcode, ready for the next
    /// quantity of the same item.
    pub fn clear_tally(&mut self) {
        self.quantity.clear();
        self.uom.clear();
        self.location.clear();
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}

/// Form contents plus the field that should hold input focus.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub form: PendingEntry,
    pub focus: EntryField,
}
