//! Static file serving module
//!
//! Maps request paths onto the root directory and builds file, listing and
//! redirect responses.

use super::error::ServeError;
use super::listing;
use super::path::{normalize_path, to_url_path};
use super::router::RequestContext;
use crate::config::FilesConfig;
use crate::http::{self, cache, mime, range::RangeParseResult, FileHeaders, ResponseBody};
use crate::logger;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::Response;
use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// What a request path resolved to
#[derive(Debug)]
pub enum Resolved {
    /// A regular file, possibly a directory's default document
    File { path: PathBuf, metadata: Metadata },
    /// A directory without a default document
    Listing { dir: PathBuf, metadata: Metadata },
    /// Canonical URL of the resource: an absolute, re-encoded path
    Redirect(String),
}

/// Serves one directory tree; shared read-only by all connections
#[derive(Debug, Clone)]
pub struct DirectoryHandler {
    /// Canonical root directory
    root: PathBuf,
    index_files: Vec<String>,
    directory_listing: bool,
}

impl DirectoryHandler {
    /// Create a handler for `root`, which must exist
    pub fn new(
        root: impl AsRef<Path>,
        index_files: Vec<String>,
        directory_listing: bool,
    ) -> io::Result<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Root directory '{}' is not accessible: {e}", root.display()),
            )
        })?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Root '{}' is not a directory", root.display()),
            ));
        }

        Ok(Self {
            root: canonical,
            index_files,
            directory_listing,
        })
    }

    pub fn from_config(config: &FilesConfig) -> io::Result<Self> {
        Self::new(
            &config.root,
            config.index_files.clone(),
            config.directory_listing,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve a request; every failure becomes an error status
    pub async fn serve(&self, ctx: &RequestContext<'_>) -> Response<ResponseBody> {
        let result = match self.resolve(ctx.path).await {
            Ok(Resolved::File { path, metadata }) => serve_file(ctx, &path, &metadata).await,
            Ok(Resolved::Listing { dir, metadata }) => serve_listing(ctx, &dir, &metadata).await,
            Ok(Resolved::Redirect(location)) => {
                let location = match ctx.query {
                    Some(query) => format!("{location}?{query}"),
                    None => location,
                };
                Ok(http::build_redirect_response(&location))
            }
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            log_serve_error(&e);
            http::build_error_response(e.status())
        })
    }

    /// Resolve a raw request path to a file, a listing or a redirect
    pub async fn resolve(&self, request_path: &str) -> Result<Resolved, ServeError> {
        let relative = normalize_path(request_path)
            .ok_or_else(|| ServeError::OutsideRoot(request_path.to_string()))?;
        let candidate = self.contained(&self.root.join(&relative), request_path).await?;
        let metadata = fs::metadata(&candidate)
            .await
            .map_err(|e| ServeError::from_io(e, request_path))?;

        if !metadata.is_dir() {
            // "/file.txt/" names the file, not a directory
            if request_path.ends_with('/') {
                return Ok(Resolved::Redirect(to_url_path(&relative)));
            }
            return Ok(Resolved::File {
                path: candidate,
                metadata,
            });
        }

        if !request_path.ends_with('/') {
            let location = to_url_path(&relative);
            return Ok(Resolved::Redirect(if location.ends_with('/') {
                location
            } else {
                format!("{location}/")
            }));
        }

        for index in &self.index_files {
            let Ok(index_path) = self.contained(&candidate.join(index), request_path).await else {
                continue;
            };
            if let Ok(index_meta) = fs::metadata(&index_path).await {
                if index_meta.is_file() {
                    return Ok(Resolved::File {
                        path: index_path,
                        metadata: index_meta,
                    });
                }
            }
        }

        if self.directory_listing {
            Ok(Resolved::Listing {
                dir: candidate,
                metadata,
            })
        } else {
            Err(ServeError::ListingDisabled(request_path.to_string()))
        }
    }

    /// Canonicalize `path` and ensure it stays under the root (symlinks included)
    async fn contained(&self, path: &Path, request_path: &str) -> Result<PathBuf, ServeError> {
        let canonical = fs::canonicalize(path)
            .await
            .map_err(|e| ServeError::from_io(e, request_path))?;
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(ServeError::OutsideRoot(request_path.to_string()))
        }
    }
}

/// Build the response for a regular file, honouring validators and ranges
async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    metadata: &Metadata,
) -> Result<Response<ResponseBody>, ServeError> {
    let size = metadata.len();
    let modified = metadata.modified().ok();
    let etag = cache::generate_etag(size, modified);
    let last_modified = modified.map(cache::format_http_date);

    // If-None-Match takes precedence over If-Modified-Since (RFC 7232 §6)
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match, &etag)
    } else {
        cache::not_modified_since(ctx.if_modified_since, modified)
    };
    if not_modified {
        return Ok(http::build_304_response(
            Some(&etag),
            last_modified.as_deref(),
        ));
    }

    let range = if cache::range_validator_matches(ctx.if_range, &etag, modified) {
        http::parse_range_header(ctx.range_header, size)
    } else {
        RangeParseResult::None
    };

    let headers = FileHeaders {
        content_type: mime::get_content_type(path),
        etag,
        last_modified,
    };

    match range {
        RangeParseResult::Valid(range) => {
            let body = if ctx.is_head {
                http::empty_body()
            } else {
                file_body(path, range.start, range.length())
                    .await
                    .map_err(|e| ServeError::from_io(e, ctx.path))?
            };
            Ok(http::response::build_partial_response(
                body, range, size, &headers,
            ))
        }
        RangeParseResult::NotSatisfiable => Ok(http::build_416_response(size)),
        RangeParseResult::None => {
            let body = if ctx.is_head {
                http::empty_body()
            } else {
                file_body(path, 0, size)
                    .await
                    .map_err(|e| ServeError::from_io(e, ctx.path))?
            };
            Ok(http::response::build_file_response(body, size, &headers))
        }
    }
}

/// Stream `length` bytes starting at `start`, read in chunks as the client consumes them
///
/// The file is opened before the response is built, so open failures still
/// become an error status.
async fn file_body(path: &Path, start: u64, length: u64) -> io::Result<ResponseBody> {
    let mut file = fs::File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    let chunks = ReaderStream::new(file.take(length)).map_ok(Frame::data);
    Ok(StreamBody::new(chunks).boxed_unsync())
}

/// Build the generated listing for a directory
async fn serve_listing(
    ctx: &RequestContext<'_>,
    dir: &Path,
    metadata: &Metadata,
) -> Result<Response<ResponseBody>, ServeError> {
    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);
    if cache::not_modified_since(ctx.if_modified_since, modified) {
        return Ok(http::build_304_response(None, last_modified.as_deref()));
    }

    let entries = listing::read_listing(dir)
        .await
        .map_err(|e| ServeError::from_io(e, ctx.path))?;
    let html = listing::render_listing(ctx.path, &entries);
    Ok(http::build_html_response(
        html,
        ctx.is_head,
        last_modified.as_deref(),
    ))
}

fn log_serve_error(err: &ServeError) {
    match err {
        // File not found is common (404), no need to log it
        ServeError::NotFound(_) => {}
        ServeError::OutsideRoot(path) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        }
        ServeError::PermissionDenied(_) | ServeError::ListingDisabled(_) => {
            logger::log_debug(&err.to_string());
        }
        ServeError::Io { .. } => logger::log_error(&err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;
    use hyper::StatusCode;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "dirserve-static-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn handler(root: &Path) -> DirectoryHandler {
        DirectoryHandler::new(root, vec!["index.html".to_string()], true).unwrap()
    }

    fn get(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            ..RequestContext::default()
        }
    }

    async fn body_bytes(response: Response<ResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn header<'a>(response: &'a Response<ResponseBody>, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_missing_root_rejected() {
        let dir = scratch_dir("missing-root");
        assert!(DirectoryHandler::new(dir.join("nope"), Vec::new(), true).is_err());

        std::fs::write(dir.join("file"), b"x").unwrap();
        assert!(DirectoryHandler::new(dir.join("file"), Vec::new(), true).is_err());
    }

    #[tokio::test]
    async fn test_serves_regular_file() {
        let root = scratch_dir("file");
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();

        let response = handler(&root).serve(&get("/hello.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-length"), Some("2"));
        assert_eq!(
            header(&response, "content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert!(header(&response, "etag").is_some());
        assert!(header(&response, "last-modified").is_some());
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"hi"));
    }

    #[tokio::test]
    async fn test_head_has_length_but_no_body() {
        let root = scratch_dir("head");
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();

        let ctx = RequestContext {
            is_head: true,
            ..get("/hello.txt")
        };
        let response = handler(&root).serve(&ctx).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-length"), Some("2"));
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let root = scratch_dir("missing");
        let h = handler(&root);
        assert_eq!(h.serve(&get("/missing.txt")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            h.serve(&get("/missing/deeper.txt")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_file_used_as_directory_is_404() {
        let root = scratch_dir("notdir");
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();
        let response = handler(&root).serve(&get("/hello.txt/child")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_never_leaks() {
        let parent = scratch_dir("traversal");
        std::fs::write(parent.join("secret.txt"), b"top secret").unwrap();
        let root = parent.join("public");
        std::fs::create_dir_all(&root).unwrap();
        let h = handler(&root);

        for path in ["/../secret.txt", "/%2e%2e/secret.txt", "/a/../../secret.txt"] {
            let response = h.serve(&get(path)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
            assert_ne!(body_bytes(response).await, Bytes::from_static(b"top secret"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_blocked() {
        let parent = scratch_dir("symlink");
        std::fs::write(parent.join("secret.txt"), b"top secret").unwrap();
        let root = parent.join("public");
        std::fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(parent.join("secret.txt"), root.join("link.txt")).unwrap();

        let response = handler(&root).serve(&get("/link.txt")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_directory_index_served() {
        let root = scratch_dir("index");
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("docs/index.html"), b"<h1>docs</h1>").unwrap();
        let h = handler(&root);

        let via_dir = h.serve(&get("/docs/")).await;
        assert_eq!(via_dir.status(), StatusCode::OK);
        assert_eq!(
            header(&via_dir, "content-type"),
            Some("text/html; charset=utf-8")
        );
        let direct = h.serve(&get("/docs/index.html")).await;
        assert_eq!(body_bytes(via_dir).await, body_bytes(direct).await);
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let root = scratch_dir("redirect");
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();
        let h = handler(&root);

        let response = h.serve(&get("/docs")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(header(&response, "location"), Some("/docs/"));

        let with_query = RequestContext {
            query: Some("sort=name"),
            ..get("/docs")
        };
        let response = h.serve(&with_query).await;
        assert_eq!(header(&response, "location"), Some("/docs/?sort=name"));

        let response = h.serve(&get("/hello.txt/")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(header(&response, "location"), Some("/hello.txt"));
    }

    #[tokio::test]
    async fn test_redirects_stay_on_this_host() {
        let root = scratch_dir("redirect-host");
        std::fs::create_dir_all(root.join("evil.example")).unwrap();
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();
        std::fs::create_dir_all(root.join("my docs")).unwrap();
        let h = handler(&root);

        let cases = [
            ("//evil.example", "/evil.example/"),
            ("///evil.example", "/evil.example/"),
            ("//hello.txt/", "/hello.txt"),
            ("/./evil.example", "/evil.example/"),
            ("/my%20docs", "/my%20docs/"),
        ];
        for (path, expected) in cases {
            let response = h.serve(&get(path)).await;
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
            assert_eq!(header(&response, "location"), Some(expected), "{path}");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_403() {
        use std::os::unix::fs::PermissionsExt;

        let root = scratch_dir("unreadable");
        let locked = root.join("locked.txt");
        std::fs::write(&locked, b"hidden").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through mode bits; nothing to check then
        if std::fs::File::open(&locked).is_ok() {
            return;
        }

        let response = handler(&root).serve(&get("/locked.txt")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"403 Forbidden\n"));
    }

    #[tokio::test]
    async fn test_large_file_streamed_intact() {
        let root = scratch_dir("large");
        let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(root.join("blob.bin"), &content).unwrap();
        let h = handler(&root);

        let response = h.serve(&get("/blob.bin")).await;
        assert_eq!(header(&response, "content-length"), Some("300000"));
        assert_eq!(body_bytes(response).await, Bytes::from(content.clone()));

        let tail = RequestContext {
            range_header: Some("bytes=299990-"),
            ..get("/blob.bin")
        };
        assert_eq!(
            body_bytes(h.serve(&tail).await).await,
            Bytes::from(content[299_990..].to_vec())
        );
    }

    #[tokio::test]
    async fn test_listing_enumerates_children() {
        let root = scratch_dir("listing");
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        let h = handler(&root);

        let first = h.serve(&get("/")).await;
        assert_eq!(first.status(), StatusCode::OK);
        let first = body_bytes(first).await;
        let html = String::from_utf8(first.to_vec()).unwrap();
        assert!(html.contains("hello.txt"));
        assert!(html.contains("href=\"sub/\""));

        let second = body_bytes(h.serve(&get("/")).await).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_listing_disabled_is_403() {
        let root = scratch_dir("nolisting");
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();
        let h = DirectoryHandler::new(&root, vec!["index.html".to_string()], false).unwrap();

        for _ in 0..2 {
            assert_eq!(h.serve(&get("/")).await.status(), StatusCode::FORBIDDEN);
        }
        // Files are unaffected
        assert_eq!(h.serve(&get("/hello.txt")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_conditional_requests() {
        let root = scratch_dir("conditional");
        std::fs::write(root.join("hello.txt"), b"hi").unwrap();
        let h = handler(&root);

        let first = h.serve(&get("/hello.txt")).await;
        let etag = header(&first, "etag").unwrap().to_string();
        let last_modified = header(&first, "last-modified").unwrap().to_string();

        let by_etag = RequestContext {
            if_none_match: Some(etag.as_str()),
            ..get("/hello.txt")
        };
        let response = h.serve(&by_etag).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body_bytes(response).await.is_empty());

        let by_date = RequestContext {
            if_modified_since: Some(last_modified.as_str()),
            ..get("/hello.txt")
        };
        assert_eq!(h.serve(&by_date).await.status(), StatusCode::NOT_MODIFIED);

        // A stale ETag wins over a fresh date
        let stale_etag = RequestContext {
            if_none_match: Some("\"stale\""),
            if_modified_since: Some(last_modified.as_str()),
            ..get("/hello.txt")
        };
        assert_eq!(h.serve(&stale_etag).await.status(), StatusCode::OK);

        let old_date = RequestContext {
            if_modified_since: Some("Sun, 06 Nov 1994 08:49:37 GMT"),
            ..get("/hello.txt")
        };
        assert_eq!(h.serve(&old_date).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_requests() {
        let root = scratch_dir("range");
        std::fs::write(root.join("digits.txt"), b"0123456789").unwrap();
        let h = handler(&root);

        let partial = RequestContext {
            range_header: Some("bytes=2-5"),
            ..get("/digits.txt")
        };
        let response = h.serve(&partial).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header(&response, "content-range"), Some("bytes 2-5/10"));
        assert_eq!(header(&response, "content-length"), Some("4"));
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"2345"));

        let suffix = RequestContext {
            range_header: Some("bytes=-3"),
            ..get("/digits.txt")
        };
        assert_eq!(
            body_bytes(h.serve(&suffix).await).await,
            Bytes::from_static(b"789")
        );

        let beyond = RequestContext {
            range_header: Some("bytes=50-"),
            ..get("/digits.txt")
        };
        let response = h.serve(&beyond).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header(&response, "content-range"), Some("bytes */10"));

        let stale_if_range = RequestContext {
            range_header: Some("bytes=2-5"),
            if_range: Some("\"stale\""),
            ..get("/digits.txt")
        };
        let response = h.serve(&stale_if_range).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"0123456789"));
    }
}
