use std::time::Duration;

use super::debounce::DEFAULT_DEBOUNCE_WINDOW;
use super::detector::BarcodeFormat;

/// Timing knobs for the capture loop.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Delay between frame samples; roughly one display refresh.
    pub frame_interval: Duration,

    /// Same-value re-scans inside this window are ignored.
    pub debounce_window: Duration,

    /// A detector call slower than this is abandoned and the frame skipped.
    pub detect_timeout: Duration,

    /// Symbologies accepted from the detector.
    pub formats: Vec<BarcodeFormat>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            detect_timeout: Duration::from_secs(2),
            formats: BarcodeFormat::SHELF_DEFAULTS.to_vec(),
        }
    }
}
