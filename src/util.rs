//! Small helpers shared across the crate.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

/// Get a time-based seed value for pseudo-random number generation.
pub fn time_seed_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(12345)
}

const MODIFIED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Current UTC time as `YYYY-MM-DDThh:mm:ssZ`, for `dcterms:modified`.
pub fn utc_timestamp() -> String {
    format_modified(Utc::now())
}

fn format_modified(at: DateTime<Utc>) -> String {
    at.format(MODIFIED_FORMAT).to_string()
}

/// Generate a random-looking UUID v4 string (not cryptographically secure).
pub fn uuid_v4() -> String {
    let mut state = time_seed_nanos();
    let mut bytes = [0u8; 16];
    for byte in &mut bytes {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *byte = (state >> 33) as u8;
    }

    // Version 4, variant 2.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

// ============================================================================
// Encoding Detection
// ============================================================================

/// Decode bytes to a string, handling various encodings.
///
/// 1. UTF-8 (BOM handled by encoding_rs)
/// 2. The hint encoding, typically from `<meta charset>`
/// 3. Windows-1252, a superset of ISO-8859-1
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the declared charset from an HTML `<meta>` tag.
///
/// Handles both `<meta charset="...">` and the older
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">`.
/// Only the first 1024 bytes are inspected, as browsers do.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<String> {
    let prefix = &bytes[..bytes.len().min(1024)];

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let mut value = &prefix[pos + 8..];

    if let Some(&quote) = value.first()
        && (quote == b'"' || quote == b'\'')
    {
        value = &value[1..];
    }

    let end = value
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(value.len());

    let name = std::str::from_utf8(&value[..end]).ok()?;
    (!name.is_empty()).then(|| name.to_string())
}

// ============================================================================
// Resource Format Detection
// ============================================================================

/// Media formats a book package can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
    Css,
    /// TrueType font
    Ttf,
    /// OpenType font
    Otf,
    Woff,
    Woff2,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Css => "text/css",
            MediaFormat::Ttf => "font/ttf",
            MediaFormat::Otf => "font/otf",
            MediaFormat::Woff => "font/woff",
            MediaFormat::Woff2 => "font/woff2",
            MediaFormat::Binary => "application/octet-stream",
        }
    }

    /// Check if this format represents an image.
    pub fn is_image(self) -> bool {
        matches!(
            self,
            MediaFormat::Jpeg
                | MediaFormat::Png
                | MediaFormat::Gif
                | MediaFormat::Svg
                | MediaFormat::WebP
        )
    }
}

/// Detect resource format from file path, falling back to magic bytes.
pub fn detect_media_format(path: &str, data: &[u8]) -> MediaFormat {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => return MediaFormat::Jpeg,
        "png" => return MediaFormat::Png,
        "gif" => return MediaFormat::Gif,
        "svg" => return MediaFormat::Svg,
        "webp" => return MediaFormat::WebP,
        "css" => return MediaFormat::Css,
        "ttf" => return MediaFormat::Ttf,
        "otf" => return MediaFormat::Otf,
        "woff" => return MediaFormat::Woff,
        "woff2" => return MediaFormat::Woff2,
        _ => {}
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MediaFormat::Jpeg;
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        return MediaFormat::Png;
    }
    if data.starts_with(b"GIF") {
        return MediaFormat::Gif;
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return MediaFormat::WebP;
    }
    if data.starts_with(b"wOFF") {
        return MediaFormat::Woff;
    }
    if data.starts_with(b"wOF2") {
        return MediaFormat::Woff2;
    }
    if data.starts_with(b"OTTO") {
        return MediaFormat::Otf;
    }
    if data.starts_with(&[0x00, 0x01, 0x00, 0x00]) {
        return MediaFormat::Ttf;
    }

    MediaFormat::Binary
}
