use std::path::Path;

use image::GenericImageView;

use crate::models::ScanResult;

use super::decoder;

/// Decode a QR payload from a user-supplied image file.
///
/// Non-image paths are rejected up front by file-name media type, before any
/// pixels are read. Every other failure reports "no result"; this path never
/// surfaces an error and finds at most one code per file.
pub fn scan_image_file(path: &Path) -> Option<ScanResult> {
    if image::ImageFormat::from_path(path).is_err() {
        tracing::debug!("Not an image file: {}", path.display());
        return None;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!("Failed to rasterize {}: {}", path.display(), e);
            return None;
        }
    };

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let rgba = img.to_rgba8();
    let content = decoder::decode_rgba(rgba.as_raw(), width, height)?;

    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "QR Code".to_string());

    Some(ScanResult {
        content,
        source: path.display().to_string(),
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr;

    fn write_qr_png(dir: &Path, name: &str, payload: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let code = qr::encode(payload).unwrap();
        qr::save_png(&code, &path).unwrap();
        path
    }

    #[test]
    fn decodes_a_qr_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_qr_png(dir.path(), "ticket.png", "EVT-2214");

        let result = scan_image_file(&path).unwrap();
        assert_eq!(result.content, "EVT-2214");
        assert_eq!(result.label, "ticket.png");
        assert_eq!(result.source, path.display().to_string());
    }

    #[test]
    fn rejects_non_image_media_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        assert!(scan_image_file(&path).is_none());
    }

    #[test]
    fn missing_file_reports_no_result() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_image_file(&dir.path().join("gone.png")).is_none());
    }

    #[test]
    fn image_without_a_code_reports_no_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        image::GrayImage::from_pixel(120, 120, image::Luma([255]))
            .save(&path)
            .unwrap();

        assert!(scan_image_file(&path).is_none());
    }
}
