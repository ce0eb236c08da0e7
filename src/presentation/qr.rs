//! Verification QR codes.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use url::Url;

use crate::presentation::PresentationError;

/// Pixels per QR module in the PNG.
pub const MODULE_PIXELS: u32 = 10;

/// Frontend page that verifies `credential_id`, which is percent-encoded as
/// a single path segment.
pub fn verification_url(frontend_base_url: &str, credential_id: &str) -> Result<String, PresentationError> {
    let mut url = Url::parse(frontend_base_url)
        .map_err(|e| PresentationError::Qr(format!("invalid frontend URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| PresentationError::Qr(format!("frontend URL cannot be a base: {}", frontend_base_url)))?
        .pop_if_empty()
        .extend(["verify", credential_id]);
    Ok(url.to_string())
}

/// Encode `data` with low error correction (smallest symbol).
pub fn encode(data: &str) -> Result<QrCode, PresentationError> {
    QrCode::with_error_correction_level(data, EcLevel::L)
        .map_err(|e| PresentationError::Qr(e.to_string()))
}

/// Dark/light module grid, row-major, without the quiet zone.
pub fn modules(code: &QrCode) -> Vec<Vec<bool>> {
    let width = code.width();
    code.to_colors()
        .chunks(width)
        .map(|row| row.iter().map(|c| *c == Color::Dark).collect())
        .collect()
}

/// Black-on-white PNG with a 4-module quiet zone.
pub fn png(data: &str) -> Result<Vec<u8>, PresentationError> {
    let image = encode(data)?
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| PresentationError::Qr(e.to_string()))?;
    Ok(bytes)
}

/// PNG as a `data:image/png;base64,...` URI.
pub fn png_data_uri(data: &str) -> Result<String, PresentationError> {
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png(data)?)))
}
