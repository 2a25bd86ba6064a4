use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::config::CaptureConfig;
use super::debounce::DetectionDebounce;
use super::detector::{first_candidate, BarcodeDetector, BarcodeFormat};
use super::device::StreamGuard;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_info, log_warn};

/// A barcode value that made it through the debounce filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDetection {
    pub value: String,
    pub detected_at: DateTime<Utc>,
}

/// Samples the stream once per tick until cancelled.
///
/// Frame work runs inline, so a slow detector stretches the tick instead of
/// queueing frames. The stream is released when the loop exits, however it
/// exits.
pub async fn capture_loop(
    mut stream: StreamGuard,
    detector: Arc<dyn BarcodeDetector>,
    config: CaptureConfig,
    cancel_token: CancellationToken,
    detections: mpsc::Sender<ScanDetection>,
) {
    let mut ticker = tokio::time::interval(config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut debounce = DetectionDebounce::new(config.debounce_window);
    let mut buffer = RgbaImage::new(0, 0);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("capture loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let fut = scan_frame(
                    &mut stream,
                    &mut buffer,
                    detector.as_ref(),
                    &config.formats,
                );
                let outcome = tokio::time::timeout(config.detect_timeout, fut).await;

                if cancel_token.is_cancelled() {
                    log_debug!("scanning stopped mid-frame; discarding result");
                    break;
                }

                match outcome {
                    Ok(Ok(Some(value))) => {
                        if !debounce.accept(&value, Instant::now()) {
                            continue;
                        }
                        log_info!("Barcode detected: {value}");
                        let detection = ScanDetection { value, detected_at: Utc::now() };
                        if detections.send(detection).await.is_err() {
                            log_warn!("detection receiver dropped; stopping capture loop");
                            break;
                        }
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(err)) => log_warn!("Scan error: {err:?}"),
                    Err(_) => log_warn!(
                        "barcode detection timeout (> {}ms); frame skipped",
                        config.detect_timeout.as_millis()
                    ),
                }
            }
        }
    }

    stream.release();
}

/// Draws the current frame into the offscreen buffer and runs detection on it.
/// Returns `Ok(None)` while the stream has no picture yet.
async fn scan_frame(
    stream: &mut StreamGuard,
    buffer: &mut RgbaImage,
    detector: &dyn BarcodeDetector,
    formats: &[BarcodeFormat],
) -> Result<Option<String>> {
    let Some(video) = stream.stream_mut() else {
        return Ok(None);
    };

    let (width, height) = video.dimensions();
    if width == 0 || height == 0 {
        return Ok(None);
    }

    if buffer.dimensions() != (width, height) {
        *buffer = RgbaImage::new(width, height);
    }
    video
        .draw_frame(buffer)
        .context("failed to draw video frame")?;

    let candidates = detector.detect(buffer).await?;
    Ok(first_candidate(&candidates, formats).map(str::to_string))
}
