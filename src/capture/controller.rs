use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::CaptureConfig;
use super::detector::BarcodeDetector;
use super::device::{Camera, CameraError, StreamConstraints, StreamGuard};
use super::loop_worker::{capture_loop, ScanDetection};
use super::state::ScannerStatus;

/// What the host offers for camera scanning. Either half missing means the
/// app runs in manual-entry mode.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub camera: Option<Arc<dyn Camera>>,
    pub detector: Option<Arc<dyn BarcodeDetector>>,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(camera: Arc<dyn Camera>, detector: Arc<dyn BarcodeDetector>) -> Self {
        Self {
            camera: Some(camera),
            detector: Some(detector),
        }
    }

    pub fn can_scan(&self) -> bool {
        self.camera.is_some() && self.detector.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Barcode detection not supported on this device. You can still enter barcodes manually.")]
    DetectorUnavailable,
    #[error("Scanner is already running.")]
    AlreadyScanning,
    #[error("Could not start camera: {0}")]
    Camera(#[from] CameraError),
}

#[derive(Default)]
struct CaptureTask {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// Owns the camera stream between `start` and `stop` and runs the capture loop.
#[derive(Clone)]
pub struct ScannerController {
    task: Arc<Mutex<CaptureTask>>,
    status: Arc<watch::Sender<ScannerStatus>>,
    capabilities: Capabilities,
    config: CaptureConfig,
    detections: mpsc::Sender<ScanDetection>,
}

impl ScannerController {
    pub fn new(
        capabilities: Capabilities,
        config: CaptureConfig,
        detections: mpsc::Sender<ScanDetection>,
    ) -> Self {
        let (status, _) = watch::channel(ScannerStatus::initial(capabilities.can_scan()));

        Self {
            task: Arc::new(Mutex::new(CaptureTask::default())),
            status: Arc::new(status),
            capabilities,
            config,
            detections,
        }
    }

    pub fn status(&self) -> ScannerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScannerStatus> {
        self.status.subscribe()
    }

    /// Idle → Scanning. Fails without side effects when the host cannot scan,
    /// when already scanning, or when the camera cannot be acquired.
    pub async fn start(&self) -> Result<(), ScanError> {
        let (Some(camera), Some(detector)) = (
            self.capabilities.camera.clone(),
            self.capabilities.detector.clone(),
        ) else {
            return Err(ScanError::DetectorUnavailable);
        };

        let mut task = self.task.lock().await;
        if task.handle.is_some() {
            return Err(ScanError::AlreadyScanning);
        }

        let stream = match camera.acquire(&StreamConstraints::default()).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!("camera acquisition failed: {err}");
                let err = ScanError::from(err);
                let message = err.to_string();
                self.status.send_modify(|status| status.message = message);
                return Err(err);
            }
        };

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            StreamGuard::new(stream),
            detector,
            self.config.clone(),
            cancel_token.clone(),
            self.detections.clone(),
        ));

        task.handle = Some(handle);
        task.cancel_token = Some(cancel_token);
        self.status.send_modify(ScannerStatus::start);
        info!("scanner started");
        Ok(())
    }

    /// Scanning → Idle. Safe to call at any time and any number of times;
    /// returns once the capture loop has exited and released the stream.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;

        if let Some(token) = task.cancel_token.take() {
            token.cancel();
        }

        let Some(handle) = task.handle.take() else {
            return;
        };

        self.status.send_modify(ScannerStatus::stop);

        if let Err(err) = handle.await {
            error!("capture loop task failed to join: {err}");
        }
        info!("scanner stopped");
    }

    /// Reflects an accepted detection on the status line.
    pub fn note_detection(&self, value: &str) {
        self.status.send_modify(|status| status.detected(value));
    }
}
