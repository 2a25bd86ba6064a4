pub mod controller;
pub mod form;

pub use controller::{validate, EntryController, EntryError, ValidEntry};
pub use form::{EntryField, EntrySnapshot, PendingEntry};
