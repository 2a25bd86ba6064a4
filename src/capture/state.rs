use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

pub const MSG_DETECTOR_READY: &str = "Barcode detection supported: you can scan with the camera.";
pub const MSG_DETECTOR_MISSING: &str =
    "Barcode detection not supported. Enter barcodes manually.";
pub const MSG_RUNNING: &str = "Scanner running. Point at a barcode.";
pub const MSG_STOPPED: &str = "Scanner stopped.";

/// What the status line shows, plus whether the start control is usable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScannerStatus {
    pub state: ScanState,
    pub detector_available: bool,
    pub message: String,
}

impl ScannerStatus {
    pub fn initial(detector_available: bool) -> Self {
        Self {
            state: ScanState::Idle,
            detector_available,
            message: if detector_available {
                MSG_DETECTOR_READY
            } else {
                MSG_DETECTOR_MISSING
            }
            .to_string(),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    pub fn can_start(&self) -> bool {
        self.detector_available && self.state == ScanState::Idle
    }

    pub fn start(&mut self) {
        self.state = ScanState::Scanning;
        self.message = MSG_RUNNING.to_string();
    }

    pub fn stop(&mut self) {
        self.state = ScanState::Idle;
        self.message = MSG_STOPPED.to_string();
    }

    pub fn detected(&mut self, value: &str) {
        self.message = format!("Barcode detected: {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_control_requires_detector_and_idle() {
        let mut status = ScannerStatus::initial(true);
        assert!(status.can_start());
        status.start();
        assert!(!status.can_start());
        status.stop();
        assert!(status.can_start());

        assert!(!ScannerStatus::initial(false).can_start());
    }

    #[test]
    fn missing_detector_points_to_manual_entry() {
        let status = ScannerStatus::initial(false);
        assert!(status.message.contains("manually"));
    }

    #[test]
    fn serializes_for_the_web_view() {
        let json = serde_json::to_value(ScannerStatus::initial(true)).unwrap();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["detectorAvailable"], true);
    }
}
