//! Request handler module
//!
//! Maps request paths onto the served directory tree: path normalization, file
//! responses, directory listings and error mapping.

pub mod error;
pub mod listing;
pub mod path;
pub mod router;
pub mod static_files;

// Re-export main entry points
pub use error::ServeError;
pub use router::{handle_request, RequestContext};
pub use static_files::{DirectoryHandler, Resolved};
