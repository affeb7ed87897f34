//! HTTP response building module
//!
//! Provides builders for the responses a file server produces, decoupled from filesystem access.

use super::cache::CACHE_CONTROL;
use super::range::ByteRange;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL as CACHE_CONTROL_HEADER, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, LAST_MODIFIED, LOCATION,
};
use hyper::{Response, StatusCode};
use std::io;

/// Body of every response: buffered text or a file streamed from disk
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Body holding `bytes` in memory
pub fn full_body(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty_body() -> ResponseBody {
    full_body(Bytes::new())
}

/// Methods served; also the `Allow` header value
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Validators and type of a file, shared by the 200 and 206 builders
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: String,
    pub etag: String,
    /// HTTP date, absent when the platform reports no mtime
    pub last_modified: Option<String>,
}

/// Build 200 OK response for a whole file
///
/// `content_length` is the file size; for HEAD the body is empty but the
/// length still describes the representation.
pub fn build_file_response(
    body: ResponseBody,
    content_length: u64,
    headers: &FileHeaders,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, &headers.content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, &headers.etag)
        .header(CACHE_CONTROL_HEADER, CACHE_CONTROL);
    if let Some(last_modified) = &headers.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(empty_body())
    })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    body: ResponseBody,
    range: ByteRange,
    total_size: u64,
    headers: &FileHeaders,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, &headers.content_type)
        .header(CONTENT_LENGTH, range.length())
        .header(CONTENT_RANGE, range.content_range(total_size))
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, &headers.etag)
        .header(CACHE_CONTROL_HEADER, CACHE_CONTROL);
    if let Some(last_modified) = &headers.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(empty_body())
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: Option<&str>, last_modified: Option<&str>) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(CACHE_CONTROL_HEADER, CACHE_CONTROL);
    if let Some(etag) = etag {
        builder = builder.header(ETAG, etag);
    }
    if let Some(last_modified) = last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(empty_body()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(empty_body())
    })
}

/// Build 301 redirect response (directory requested without its trailing slash)
pub fn build_redirect_response(location: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full_body("Moved Permanently\n"))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(empty_body())
        })
}

/// Build plain-text error response, e.g. `404 Not Found`
pub fn build_error_response(status: StatusCode) -> Response<ResponseBody> {
    let text = format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len())
        .body(full_body(text))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty_body())
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED);
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(empty_body())
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    let mut response = build_error_response(StatusCode::RANGE_NOT_SATISFIABLE);
    if let Ok(value) = format!("bytes */{file_size}").parse() {
        response.headers_mut().insert(CONTENT_RANGE, value);
    }
    response
}

/// Build generic HTML response
pub fn build_html_response(
    content: String,
    is_head: bool,
    last_modified: Option<&str>,
) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        empty_body()
    } else {
        full_body(content)
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length)
        .header(CACHE_CONTROL_HEADER, CACHE_CONTROL);
    if let Some(last_modified) = last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("HTML", &e);
        Response::new(empty_body())
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
