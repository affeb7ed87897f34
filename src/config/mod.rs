// Configuration module entry point
// Built-in defaults only; no file, flag or environment variable is consulted

mod types;

use ::config::builder::{ConfigBuilder, DefaultState};
use std::net::SocketAddr;

pub use types::{Config, FilesConfig, LoggingConfig, ServerConfig};

pub const DEFAULT_PORT: u16 = 8081;

impl Config {
    /// Load the built-in configuration
    ///
    /// The served tree is the working directory, so nothing in it is read as
    /// configuration.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        defaults()?.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Every key with its built-in value
fn defaults() -> Result<ConfigBuilder<DefaultState>, ::config::ConfigError> {
    ::config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", i64::from(DEFAULT_PORT))?
        .set_default("server.keep_alive", true)?
        .set_default("files.root", ".")?
        .set_default("files.index_files", vec!["index.html", "index.htm"])?
        .set_default("files.directory_listing", true)?
        .set_default("logging.level", "info")
}
