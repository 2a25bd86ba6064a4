use anyhow::Result;
use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    UpcA,
    UpcE,
    QrCode,
}

impl BarcodeFormat {
    /// Symbologies found on retail and warehouse shelf labels.
    pub const SHELF_DEFAULTS: [BarcodeFormat; 7] = [
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::QrCode,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedBarcode {
    pub raw_value: String,
    pub format: Option<BarcodeFormat>,
}

impl DetectedBarcode {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            format: None,
        }
    }
}

/// Platform barcode recognition. Decoding itself is out of this crate's hands;
/// hosts without it leave the detector unset and the UI falls back to typing.
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    async fn detect(&self, image: &RgbaImage) -> Result<Vec<DetectedBarcode>>;
}

/// Only the first candidate of a frame counts, and only if it carries text.
/// A candidate whose symbology is known but was not requested is ignored.
pub fn first_candidate<'a>(
    candidates: &'a [DetectedBarcode],
    requested: &[BarcodeFormat],
) -> Option<&'a str> {
    candidates
        .first()
        .filter(|candidate| candidate.format.map_or(true, |f| requested.contains(&f)))
        .map(|candidate| candidate.raw_value.as_str())
        .filter(|value| !value.is_empty())
}
