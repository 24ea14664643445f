//! QR code rendering for short URLs.

use base64::Engine as _;
use qrcode::QrCode;
use qrcode::render::svg;
use serde_json::json;

use crate::error::AppError;

pub const DEFAULT_QR_SIZE: u32 = 256;
const MIN_QR_SIZE: u32 = 64;
const MAX_QR_SIZE: u32 = 1024;

/// Clamps a requested QR size to 64..=1024 pixels.
pub fn clamp_qr_size(size: u32) -> u32 {
    size.clamp(MIN_QR_SIZE, MAX_QR_SIZE)
}

/// Renders `content` as an SVG QR code document.
pub fn qr_svg(content: &str, size: u32) -> Result<String, AppError> {
    let size = clamp_qr_size(size);

    let code = QrCode::new(content.as_bytes()).map_err(|e| {
        AppError::internal(
            "Failed to generate QR code",
            json!({ "reason": e.to_string() }),
        )
    })?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    Ok(image)
}

/// Same image as [`qr_svg`], wrapped in a base64 `data:` URI.
pub fn qr_data_uri(content: &str, size: u32) -> Result<String, AppError> {
    let image = qr_svg(content, size)?;

    Ok(format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image)
    ))
}
