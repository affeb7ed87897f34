//! Directory listing generation.

use std::io;
use std::path::Path;
use tokio::fs;

/// One immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read the immediate children of `dir`, sorted by name
///
/// Symlinks are classified by what they point at; dangling links show up as files.
pub async fn read_listing(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let is_dir = fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }

    entries.sort();
    Ok(entries)
}

/// Render a listing page for `request_path`
///
/// Links are relative to the directory, which is always requested with a
/// trailing slash.
pub fn render_listing(request_path: &str, entries: &[ListingEntry]) -> String {
    let title = escape_html(&urlencoding::decode(request_path).unwrap_or_default());

    let mut html = format!(
        "<!doctype html>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width\">\n<title>Index of {title}</title>\n<h1>Index of {title}</h1>\n<pre>\n"
    );
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<a href=\"{}{suffix}\">{}{suffix}</a>\n",
            urlencoding::encode(&entry.name),
            escape_html(&entry.name),
        ));
    }
    html.push_str("</pre>\n");
    html
}

/// Escape text for HTML element content and double-quoted attributes
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
