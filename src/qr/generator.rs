use std::path::Path;

use image::Luma;
use qrcode::render::unicode;
use qrcode::{EcLevel, QrCode};

use crate::error::Result;

/// Encode arbitrary text at medium error correction.
pub fn encode(text: &str) -> Result<QrCode> {
    Ok(QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)?)
}

/// Terminal rendering, two modules per character cell.
pub fn render_unicode(code: &QrCode) -> String {
    code.render::<unicode::Dense1x2>().build()
}

/// Rasterize with the default quiet zone at a comfortably scannable size.
#[allow(dead_code)]
pub fn render_image(code: &QrCode) -> image::GrayImage {
    code.render::<Luma<u8>>().min_dimensions(200, 200).build()
}

/// Export as a shareable PNG, 512 px minimum edge.
pub fn save_png(code: &QrCode, path: &Path) -> Result<()> {
    let img = code.render::<Luma<u8>>().min_dimensions(512, 512).build();
    img.save(path)?;
    Ok(())
}
