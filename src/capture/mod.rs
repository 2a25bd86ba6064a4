pub mod config;
pub mod controller;
pub mod debounce;
pub mod detector;
pub mod device;
pub mod loop_worker;
pub mod state;

pub use config::CaptureConfig;
pub use controller::{Capabilities, ScanError, ScannerController};
pub use debounce::DetectionDebounce;
pub use detector::{BarcodeDetector, BarcodeFormat, DetectedBarcode};
pub use device::{Camera, CameraError, FacingMode, StreamConstraints, VideoStream};
pub use loop_worker::ScanDetection;
pub use state::{ScanState, ScannerStatus};
