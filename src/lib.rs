//! dirserve
//!
//! Serves a single directory tree over HTTP/1.1: every request path is mapped onto a file
//! below the root directory, with conditional requests, byte ranges and generated
//! directory listings.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
