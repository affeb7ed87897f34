//! HTTP cache validation module
//!
//! Provides `ETag` / `Last-Modified` generation and conditional request handling.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Cache-Control sent with files and listings: clients must revalidate every time
pub const CACHE_CONTROL: &str = "no-cache";

/// IMF-fixdate, the preferred HTTP date format
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete ANSI C asctime() format
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Generate `ETag` from file size and modification time
///
/// The file content is never read, so validating a large file costs one `stat`.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn generate_etag(size: u64, modified: Option<SystemTime>) -> String {
    let mut hasher = DefaultHasher::new();
    size.hash(&mut hasher);
    modified.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak `ETags`: `W/"abc123"` (weak comparison, RFC 7232 §2.3.2)
/// - Wildcard: `*`
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let etag = strip_weak(etag);
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| e == "*" || strip_weak(e) == etag)
    })
}

fn strip_weak(etag: &str) -> &str {
    etag.strip_prefix("W/").unwrap_or(etag)
}

/// Format a timestamp as an HTTP date (IMF-fixdate)
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(IMF_FIXDATE).to_string()
}

/// Parse an HTTP date in any of the three formats allowed by RFC 7231 §7.1.1.1
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(SystemTime::from(dt.with_timezone(&Utc)));
    }
    [RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| SystemTime::from(naive.and_utc()))
}

/// Whole seconds since the epoch; HTTP dates carry no sub-second part
fn unix_seconds(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

/// Check `If-Modified-Since` against the resource's modification time
///
/// Returns true when the resource has not changed since the client's copy
/// (should return 304). Unparseable dates never match.
pub fn not_modified_since(if_modified_since: Option<&str>, modified: Option<SystemTime>) -> bool {
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let (Some(since), Some(modified)) = (
        parse_http_date(header).and_then(unix_seconds),
        unix_seconds(modified),
    ) else {
        return false;
    };
    modified <= since
}

/// Check `If-Range`: whether the client's cached copy still matches, so the
/// `Range` header may be honoured
///
/// An absent header always allows the range. An entity tag must match strongly;
/// a date must equal the modification time exactly.
pub fn range_validator_matches(
    if_range: Option<&str>,
    etag: &str,
    modified: Option<SystemTime>,
) -> bool {
    let Some(validator) = if_range.map(str::trim) else {
        return true;
    };
    if validator.starts_with("W/") {
        return false;
    }
    if validator.starts_with('"') {
        return validator == etag;
    }
    match (parse_http_date(validator), modified) {
        (Some(date), Some(modified)) => unix_seconds(date) == unix_seconds(modified),
        _ => false,
    }
}
