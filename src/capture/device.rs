use anyhow::Result;
use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    /// Rear camera; the one pointed at shelves.
    #[default]
    Environment,
    User,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamConstraints {
    pub facing: FacingMode,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("camera permission was denied")]
    PermissionDenied,
    #[error("no camera was found")]
    NotFound,
    #[error("camera hardware error: {0}")]
    Hardware(String),
}

/// Host access to video capture devices.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// A live video stream.
pub trait VideoStream: Send {
    /// Current frame size; `(0, 0)` until the first frame is decoded.
    fn dimensions(&self) -> (u32, u32);

    /// Copies the current frame into `target`, which is already sized to
    /// `dimensions()`.
    fn draw_frame(&mut self, target: &mut RgbaImage) -> Result<()>;

    /// Stops the underlying tracks and frees the device.
    fn release(&mut self);
}

/// Owns a stream and releases it exactly once: on an explicit `release` or
/// when dropped, whichever comes first.
pub struct StreamGuard {
    stream: Option<Box<dyn VideoStream>>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn stream_mut(&mut self) -> Option<&mut (dyn VideoStream + 'static)> {
        self.stream.as_deref_mut()
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}
