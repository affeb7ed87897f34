//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, header extraction,
//! then the directory handler for every path.

use super::static_files::DirectoryHandler;
use crate::http::{self, ResponseBody};
use crate::logger;
use hyper::header::{HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, RANGE};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub if_range: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        let headers = &parts.headers;
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_none_match: header_str(headers, &IF_NONE_MATCH),
            if_modified_since: header_str(headers, &IF_MODIFIED_SINCE),
            if_range: header_str(headers, &IF_RANGE),
            range_header: header_str(headers, &RANGE),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Main entry point for HTTP request handling
///
/// The body is never read, so any body type is accepted; it is dropped before
/// the filesystem is touched.
pub async fn handle_request<B>(
    req: Request<B>,
    handler: Arc<DirectoryHandler>,
) -> Result<Response<ResponseBody>, Infallible> {
    if let Some(resp) = check_http_method(req.method()) {
        return Ok(resp);
    }

    let (parts, _) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);
    Ok(handler.serve(&ctx).await)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_debug(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}
