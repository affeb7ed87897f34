//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use mime_guess::mime::{self, Mime};
use std::path::Path;

/// Get MIME Content-Type based on file extension
///
/// Textual types are labelled UTF-8; anything unknown is served as
/// `application/octet-stream`.
///
/// # Examples
/// ```
/// use dirserve::http::mime::get_content_type;
/// use std::path::Path;
/// assert_eq!(get_content_type(Path::new("index.html")), "text/html; charset=utf-8");
/// assert_eq!(get_content_type(Path::new("clip.mp4")), "video/mp4");
/// assert_eq!(get_content_type(Path::new("LICENSE")), "application/octet-stream");
/// ```
pub fn get_content_type(path: &Path) -> String {
    let guess = mime_guess::from_path(path).first_or_octet_stream();
    if needs_charset(&guess) {
        format!("{guess}; charset=utf-8")
    } else {
        guess.to_string()
    }
}

fn needs_charset(m: &Mime) -> bool {
    m.get_param(mime::CHARSET).is_none()
        && (m.type_() == mime::TEXT || m.subtype() == mime::JAVASCRIPT || m.subtype() == mime::JSON)
}
