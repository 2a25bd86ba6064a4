pub mod scan_record;

pub use scan_record::{RecordError, ScanRecord, StoredRecord};
