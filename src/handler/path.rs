//! Request path normalization.

use std::path::{Path, PathBuf};

/// Turn a raw request path into a path relative to the root directory
///
/// Percent-escapes are decoded first, so `%2e%2e` counts as `..`. Empty and `.`
/// segments are dropped and `..` removes the previous segment.
///
/// Returns `None` when the path cannot be served: a `..` that would climb above
/// the root, a segment containing NUL or a backslash, or escapes that do not
/// decode to UTF-8.
pub fn normalize_path(request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s if s.contains(['\0', '\\']) => return None,
            s => segments.push(s),
        }
    }

    Some(segments.iter().collect())
}

/// Absolute URL path for a normalized relative path
///
/// Segments are percent-encoded again and joined under a single leading `/`,
/// so the result can never be read as a scheme-relative `//host` URL.
pub fn to_url_path(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .iter()
        .map(|segment| urlencoding::encode(&segment.to_string_lossy()).into_owned())
        .collect();
    format!("/{}", segments.join("/"))
}
