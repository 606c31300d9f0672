/// Decode a QR payload from raw RGBA pixel data.
///
/// This is a pure function over the buffer: pixels are reduced to luminance
/// and handed to the rqrr grid detector. Only dark-on-light codes are
/// attempted. Returns the first non-empty payload, or `None`.
pub fn decode_rgba(pixels: &[u8], width: u32, height: u32) -> Option<String> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || pixels.len() < w * h * 4 {
        return None;
    }

    let luma = rgba_to_luma(pixels, w, h);
    decode_luma(&luma, w, h)
}

/// BT.601 integer weights; alpha is ignored.
fn rgba_to_luma(pixels: &[u8], w: usize, h: usize) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .take(w * h)
        .map(|px| {
            let y = (u32::from(px[0]) * 299 + u32::from(px[1]) * 587 + u32::from(px[2]) * 114) / 1000;
            y as u8
        })
        .collect()
}

fn decode_luma(luma: &[u8], w: usize, h: usize) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) if !content.is_empty() => return Some(content),
            Ok(_) => {}
            Err(e) => tracing::debug!("Grid decode failed: {}", e),
        }
    }

    None
}
