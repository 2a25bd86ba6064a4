use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(1500);

/// Suppresses a barcode held still in front of the camera.
///
/// Frames arrive far faster than anyone can react, so the same value is only
/// reported again once `window` has passed since it was last accepted. A
/// different value is always accepted.
#[derive(Debug, Clone)]
pub struct DetectionDebounce {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl DetectionDebounce {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, value: &str, now: Instant) -> bool {
        if let Some((last_value, accepted_at)) = &self.last {
            if last_value == value && now.saturating_duration_since(*accepted_at) < self.window {
                return false;
            }
        }

        self.last = Some((value.to_string(), now));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for DetectionDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
