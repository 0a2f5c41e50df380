//! MIME type detection module
//!
//! Returns the Content-Type for a request path based on its extension alone.
//! No filesystem access happens here, so combo requests can be validated
//! before any file is opened.

use std::collections::HashMap;

/// MIME type used when the extension is unknown or missing
pub const DEFAULT_MIME: &str = "text/plain";

/// Charset appended when the MIME type does not imply one
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Get MIME type for a lower-cased file extension (without the leading dot)
///
/// # Examples
/// ```
/// use combo_static::http::mime::lookup_extension;
/// assert_eq!(lookup_extension("js"), Some("application/javascript"));
/// assert_eq!(lookup_extension("xyz"), None);
/// ```
pub fn lookup_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",

        _ => return None,
    };
    Some(mime)
}

/// Extension of the last path segment, lower-cased, without the dot.
///
/// Query strings are not stripped; combo member paths never carry one.
pub fn extension_of(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Charset implied by a MIME type
pub fn charset_for(mime: &str) -> Option<&'static str> {
    if mime.starts_with("text/")
        || mime == "application/javascript"
        || mime == "application/json"
        || mime == "application/xml"
        || mime == "image/svg+xml"
    {
        Some("utf-8")
    } else {
        None
    }
}

/// Extension to MIME type table with caller-supplied overrides on top of the
/// built-in one.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    overrides: HashMap<String, String>,
}

impl MimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from configured overrides; extension keys are matched
    /// case-insensitively and may be given with or without a leading dot.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let overrides = overrides
            .iter()
            .map(|(ext, mime)| {
                (
                    ext.trim_start_matches('.').to_ascii_lowercase(),
                    mime.clone(),
                )
            })
            .collect();
        Self { overrides }
    }

    /// MIME type for a path, falling back to `text/plain`
    pub fn mime_type(&self, path: &str) -> String {
        extension_of(path)
            .and_then(|ext| {
                self.overrides
                    .get(&ext)
                    .cloned()
                    .or_else(|| lookup_extension(&ext).map(str::to_string))
            })
            .unwrap_or_else(|| DEFAULT_MIME.to_string())
    }

    /// Full Content-Type value (`<mime>; charset=<charset>`) for a path.
    ///
    /// Two paths with the same extension always produce identical values.
    pub fn content_type(&self, path: &str) -> String {
        let mime = self.mime_type(path);
        if mime.contains("charset=") {
            return mime.to_ascii_lowercase();
        }
        let charset = charset_for(&mime).unwrap_or(DEFAULT_CHARSET);
        format!("{mime}; charset={charset}").to_ascii_lowercase()
    }
}
