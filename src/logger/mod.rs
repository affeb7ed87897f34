//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - The startup banner
//! - Error and warning logging, optionally to a file
//!
//! There is no per-request access log.

pub mod writer;

use crate::config::LoggingConfig;
use chrono::Local;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

/// Log verbosity, ordered from least to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let level = config
        .level
        .parse::<Level>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writer::init(level, config.error_log_file.as_deref())
}

fn enabled(level: Level) -> bool {
    level <= writer::get().map_or(Level::Info, writer::LogWriter::level)
}

fn format_line(level: Level, message: &str) -> String {
    format!("{} [{level}] {message}", Local::now().format("%Y/%m/%d %H:%M:%S"))
}

/// Write to stdout
fn write_info(message: &str) {
    if !enabled(Level::Info) {
        return;
    }
    let line = format_line(Level::Info, message);
    match writer::get() {
        Some(w) => w.write_info(&line),
        None => println!("{line}"),
    }
}

/// Write to error log
fn write_error(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    let line = format_line(level, message);
    match writer::get() {
        Some(w) => w.write_error(&line),
        None => eprintln!("{line}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path) {
    write_info(&format!("Serving {} on http://{addr}", root.display()));
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &hyper::Error) {
    // Clients hanging up mid-request are routine
    let level = if err.is_incomplete_message() {
        Level::Debug
    } else {
        Level::Warn
    };
    write_error(level, &format!("Failed to serve connection from {peer_addr}: {err}"));
}

pub fn log_error(message: &str) {
    write_error(Level::Error, message);
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, message);
}

pub fn log_debug(message: &str) {
    write_error(Level::Debug, message);
}
