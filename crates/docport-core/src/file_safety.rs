//! Filename hygiene and content-type detection for uploads and artifacts.
//!
//! Client filenames are untrusted: they may carry directory components,
//! control characters or nothing usable at all. Everything that ends up on
//! disk goes through these helpers first.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Content types for the formats the engine commonly reads and writes.
static OFFICE_CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("pdf", "application/pdf"),
        ("txt", "text/plain; charset=utf-8"),
        ("html", "text/html; charset=utf-8"),
        ("htm", "text/html; charset=utf-8"),
        ("csv", "text/csv"),
        ("rtf", "application/rtf"),
        ("xml", "application/xml"),
        ("json", "application/json"),
        ("zip", "application/zip"),
        // Word processing
        ("doc", "application/msword"),
        (
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        ("odt", "application/vnd.oasis.opendocument.text"),
        // Spreadsheets
        ("xls", "application/vnd.ms-excel"),
        (
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
        // Presentations
        ("ppt", "application/vnd.ms-powerpoint"),
        (
            "pptx",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ),
        ("odp", "application/vnd.oasis.opendocument.presentation"),
        // Images
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
    ]
    .into_iter()
    .collect()
});

const FALLBACK_BASE_NAME: &str = "document";

/// Sanitize filename for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    // Replace dangerous characters
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension), on a char boundary
    if sanitized.len() > 200 {
        let ext = sanitized
            .rfind('.')
            .map(|pos| &sanitized[pos..])
            .filter(|ext| ext.len() <= 16)
            .unwrap_or("");
        let mut cut = 200 - ext.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        return format!("{}{}", &sanitized[..cut], ext);
    }

    sanitized.to_string()
}

/// Base name used for a persisted artifact: the sanitized client filename
/// with its last extension removed.
///
/// `"report.docx"` → `"report"`, `"../../etc/passwd"` → `"passwd"`,
/// `".docx"` → `".docx"` (a leading dot is not an extension).
pub fn artifact_base_name(original_filename: &str) -> String {
    let sanitized = sanitize_filename(original_filename);
    let stem = match sanitized.rfind('.') {
        Some(pos) if pos > 0 => &sanitized[..pos],
        _ => sanitized.as_str(),
    };
    let stem = stem.trim();
    if stem.is_empty() || stem == "." || stem == ".." {
        FALLBACK_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// Lower-cased extension of the client filename, including the leading dot.
///
/// Returns `None` when the name has no extension or the extension contains
/// anything but ASCII alphanumerics, so the staged input name stays safe.
pub fn input_extension(original_filename: &str) -> Option<String> {
    let name = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    let pos = name.rfind('.').filter(|&pos| pos > 0)?;
    let ext = &name[pos + 1..];
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Content type for a stored file.
///
/// Known office/text extensions win; otherwise the leading bytes are sniffed
/// with `infer`, falling back to `application/octet-stream`.
pub fn content_type_for(filename: &str, head: &[u8]) -> String {
    if let Some(ext) = filename.rsplit_once('.').map(|(_, ext)| ext) {
        if let Some(mime) = OFFICE_CONTENT_TYPES.get(ext.to_ascii_lowercase().as_str()) {
            return (*mime).to_string();
        }
    }

    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }

    "application/octet-stream".to_string()
}
