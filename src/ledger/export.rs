use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CSV_MIME_TYPE: &str = "text/csv";

/// A ready-to-save CSV download.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl ExportFile {
    pub fn csv(contents: String, now: DateTime<Utc>) -> Self {
        Self {
            file_name: export_file_name(now),
            mime_type: CSV_MIME_TYPE,
            contents,
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;

        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)
            .with_context(|| format!("failed to write export to {}", path.display()))?;
        Ok(path)
    }
}

/// `shelf_scanner_2024-05-01-09-30-12.csv`; sorts chronologically by name.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("shelf_scanner_{}.csv", now.format("%Y-%m-%d-%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn file_name_uses_sortable_utc_stamp() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap();
        assert_eq!(export_file_name(now), "shelf_scanner_2024-05-01-09-30-12.csv");
    }

    #[test]
    fn writes_contents_under_file_name() {
        let dir = tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let file = ExportFile::csv("Timestamp,Barcode".into(), now);

        let path = file.write_to(&dir.path().join("exports")).unwrap();

        assert_eq!(file.mime_type, "text/csv");
        assert!(path.ends_with("shelf_scanner_2024-01-02-03-04-05.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Timestamp,Barcode");
    }
}
