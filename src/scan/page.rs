use std::collections::HashSet;
use std::time::Duration;

use base64::Engine;
use futures::stream::{self, StreamExt};
use image::GenericImageView;
use regex::Regex;
use reqwest::Client;

use crate::error::Result;
use crate::models::ScanResult;

use super::decoder;

/// Images below this edge length are icon/tracking-pixel noise, not QR codes.
const MIN_DIMENSION: u32 = 50;
/// Hard deadline for fetching a single image; a stuck load must not stall the scan.
const IMAGE_TIMEOUT: Duration = Duration::from_millis(2000);
/// Max concurrent image fetches.
const MAX_CONCURRENT_FETCHES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageSource {
    /// Resolved absolute URL, fetched out of band.
    Remote(String),
    /// Inline data URI, decoded in place without a network round-trip.
    Inline(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageElement {
    source: ImageSource,
    alt: Option<String>,
}

pub struct PageScanner {
    client: Client,
}

impl PageScanner {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("qr-scout/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Scan every image on the page at `url` for QR payloads.
    pub async fn scan_page(&self, url: &str) -> Result<Vec<ScanResult>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch page: HTTP {}", response.status()).into());
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;

        Ok(self.scan_document(&html, &final_url).await)
    }

    /// Scan the images referenced by an HTML document.
    ///
    /// Remote images are re-fetched independently of the page load, capped at
    /// [`MAX_CONCURRENT_FETCHES`] in flight with a per-image deadline; inline
    /// data URIs are decoded afterwards without touching the network. A
    /// failing element contributes nothing and never aborts the batch, so
    /// this always resolves with the full result list. Results keep document
    /// order (fetched images first, then inline sources) and payloads are
    /// deduplicated with the first occurrence winning.
    pub async fn scan_document(&self, html: &str, base_url: &str) -> Vec<ScanResult> {
        let (remote, inline): (Vec<_>, Vec<_>) = extract_images(html, base_url)
            .into_iter()
            .partition(|e| matches!(e.source, ImageSource::Remote(_)));

        let mut results: Vec<ScanResult> = stream::iter(remote)
            .map(|element| self.decode_remote(element))
            .buffered(MAX_CONCURRENT_FETCHES)
            .filter_map(|result| async { result })
            .collect()
            .await;

        for element in &inline {
            if let Some(result) = decode_inline(element) {
                results.push(result);
            }
        }

        dedupe_by_content(results)
    }

    async fn decode_remote(&self, element: ImageElement) -> Option<ScanResult> {
        let ImageSource::Remote(url) = &element.source else {
            return None;
        };

        let bytes = match tokio::time::timeout(IMAGE_TIMEOUT, self.fetch_image(url)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                tracing::debug!("Failed to fetch image {}: {}", url, e);
                return None;
            }
            Err(_) => {
                tracing::debug!("Timed out fetching image {}", url);
                return None;
            }
        };

        let content = decode_image_bytes(&bytes)?;
        Some(ScanResult {
            content,
            source: url.clone(),
            label: element
                .alt
                .clone()
                .unwrap_or_else(|| "QR Code".to_string()),
        })
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("HTTP {}", response.status()).into());
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for PageScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_inline(element: &ImageElement) -> Option<ScanResult> {
    let ImageSource::Inline(uri) = &element.source else {
        return None;
    };

    let bytes = data_uri_bytes(uri)?;
    let content = decode_image_bytes(&bytes)?;
    Some(ScanResult {
        content,
        source: uri.clone(),
        label: element
            .alt
            .clone()
            .unwrap_or_else(|| "Inline QR Code".to_string()),
    })
}

/// Extract the payload of a base64 data URI. Percent-encoded text payloads
/// are not image data and are skipped.
fn data_uri_bytes(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }

    // Markup often wraps long URIs across lines.
    let payload: String = payload.split_whitespace().collect();

    match base64::engine::general_purpose::STANDARD.decode(payload) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!("Invalid data URI payload: {}", e);
            None
        }
    }
}

/// Rasterize encoded image bytes and run the decoder. Images below the
/// minimum dimension on either edge (including zero-sized ones) resolve to
/// no match, as do undecodable bytes.
fn decode_image_bytes(bytes: &[u8]) -> Option<String> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!("Failed to rasterize image: {}", e);
            return None;
        }
    };

    let (width, height) = img.dimensions();
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return None;
    }

    let rgba = img.to_rgba8();
    decoder::decode_rgba(rgba.as_raw(), width, height)
}

/// Enumerate `<img>` elements in document order, capturing src and alt.
/// Elements declaring a width or height under the minimum are skipped here,
/// before any fetch happens.
fn extract_images(html: &str, base_url: &str) -> Vec<ImageElement> {
    let Ok(tag_re) = Regex::new(r"(?i)<img\b[^>]*>") else {
        return Vec::new();
    };
    let Ok(src_re) = Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#) else {
        return Vec::new();
    };
    let Ok(alt_re) = Regex::new(r#"(?i)\balt\s*=\s*["']([^"']*)["']"#) else {
        return Vec::new();
    };
    let Ok(dim_re) = Regex::new(r#"(?i)\b(width|height)\s*=\s*["']?(\d+)["']?"#) else {
        return Vec::new();
    };

    let mut elements = Vec::new();
    for tag in tag_re.find_iter(html) {
        let tag = tag.as_str();

        let Some(src) = src_re
            .captures(tag)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
        else {
            continue;
        };

        let too_small = dim_re
            .captures_iter(tag)
            .filter_map(|cap| cap[2].parse::<u32>().ok())
            .any(|px| px < MIN_DIMENSION);
        if too_small {
            continue;
        }

        let alt = alt_re
            .captures(tag)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty());

        let source = if src.starts_with("data:") {
            ImageSource::Inline(src)
        } else {
            ImageSource::Remote(resolve_url(&src, base_url))
        };

        elements.push(ImageElement { source, alt });
    }

    elements
}

/// Resolve a potentially relative URL against a base URL
fn resolve_url(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    if let Ok(base) = url::Url::parse(base_url) {
        if let Ok(resolved) = base.join(href) {
            return resolved.to_string();
        }
    }

    href.to_string()
}

/// Drop results whose payload was already collected; first occurrence wins.
fn dedupe_by_content(results: Vec<ScanResult>) -> Vec<ScanResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.content.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr;

    const BASE: &str = "https://example.com/page";

    fn qr_png_bytes(payload: &str, min_px: u32) -> Vec<u8> {
        let code = qr::encode(payload).unwrap();
        let img = code
            .render::<image::Luma<u8>>()
            .min_dimensions(min_px, min_px)
            .build();

        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    fn qr_data_uri(payload: &str, min_px: u32) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(qr_png_bytes(payload, min_px));
        format!("data:image/png;base64,{}", encoded)
    }

    #[test]
    fn extracts_images_in_document_order() {
        let html = r#"
            <p>intro</p>
            <img src="/a.png" alt="first">
            <IMG SRC='b.png'>
            <img data-x="1" src="https://cdn.example.org/c.png" alt="">
        "#;

        let elements = extract_images(html, BASE);
        assert_eq!(elements.len(), 3);
        assert_eq!(
            elements[0].source,
            ImageSource::Remote("https://example.com/a.png".to_string())
        );
        assert_eq!(elements[0].alt.as_deref(), Some("first"));
        assert_eq!(
            elements[1].source,
            ImageSource::Remote("https://example.com/b.png".to_string())
        );
        assert_eq!(elements[1].alt, None);
        assert_eq!(
            elements[2].source,
            ImageSource::Remote("https://cdn.example.org/c.png".to_string())
        );
        // Empty alt falls through to the label fallback.
        assert_eq!(elements[2].alt, None);
    }

    #[test]
    fn declared_dimensions_filter_small_elements() {
        let html = r#"
            <img src="/pixel.gif" width="1" height="1">
            <img src="/icon.png" width="10" height="10">
            <img src="/banner.png" width="300" height="120">
        "#;

        let elements = extract_images(html, BASE);
        assert_eq!(elements.len(), 1);
        assert_eq!(
            elements[0].source,
            ImageSource::Remote("https://example.com/banner.png".to_string())
        );
    }

    #[tokio::test]
    async fn decodes_inline_images() {
        let html = format!(
            r#"<img src="{}" alt="greeting">"#,
            qr_data_uri("hello", 200)
        );

        let scanner = PageScanner::new();
        let results = scanner.scan_document(&html, BASE).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "hello");
        assert_eq!(results[0].label, "greeting");
        assert!(results[0].source.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn duplicate_payloads_collapse_to_first() {
        let html = format!(
            r#"<img src="{}" alt="first"><img src="{}" alt="second">"#,
            qr_data_uri("hello", 200),
            qr_data_uri("hello", 240)
        );

        let scanner = PageScanner::new();
        let results = scanner.scan_document(&html, BASE).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "first");
    }

    #[tokio::test]
    async fn distinct_payloads_are_all_reported() {
        let html = format!(
            r#"<img src="{}"><img src="{}">"#,
            qr_data_uri("alpha", 200),
            qr_data_uri("beta", 200)
        );

        let scanner = PageScanner::new();
        let results = scanner.scan_document(&html, BASE).await;

        let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn small_rendered_images_are_skipped() {
        // One module per pixel: a version-1 code renders under 50px.
        let uri = qr_data_uri_with_modules("tiny");
        let html = format!(r#"<img src="{}">"#, uri);

        let scanner = PageScanner::new();
        let results = scanner.scan_document(&html, BASE).await;
        assert!(results.is_empty());
    }

    fn qr_data_uri_with_modules(payload: &str) -> String {
        let code = qr::encode(payload).unwrap();
        let img = code
            .render::<image::Luma<u8>>()
            .module_dimensions(1, 1)
            .build();
        assert!(img.width() < MIN_DIMENSION);

        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    #[tokio::test]
    async fn unreachable_remote_image_contributes_nothing() {
        // Connection refused locally; resolves well inside the deadline.
        let html = r#"<img src="http://127.0.0.1:9/qr.png" alt="dead">"#;

        let scanner = PageScanner::new();
        let results = scanner.scan_document(html, BASE).await;
        assert!(results.is_empty());
    }

    #[test]
    fn non_base64_data_uri_is_skipped() {
        assert_eq!(data_uri_bytes("data:text/plain,hello%20world"), None);
        assert_eq!(data_uri_bytes("data:image/png;base64,!!!"), None);
    }
}
