//! Process-wide log sinks
//!
//! The startup banner goes to stdout; warnings and errors go to stderr, or to an
//! append-only file when `logging.error_log_file` is set.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::Level;

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

enum Sink {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl Sink {
    fn error_sink(error_log_file: Option<&str>) -> io::Result<Self> {
        match error_log_file {
            Some(path) => Ok(Self::File(Mutex::new(open_append(path)?))),
            None => Ok(Self::Stderr),
        }
    }

    // Write failures are dropped; there is nowhere left to report them
    fn write_line(&self, line: &str) {
        match self {
            Self::Stdout => println!("{line}"),
            Self::Stderr => eprintln!("{line}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{line}");
                }
            }
        }
    }
}

/// Destination and verbosity shared by every logging call
pub struct LogWriter {
    banner: Sink,
    diagnostics: Sink,
    level: Level,
}

impl LogWriter {
    fn new(level: Level, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            banner: Sink::Stdout,
            diagnostics: Sink::error_sink(error_log_file)?,
            level,
        })
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    pub fn write_info(&self, line: &str) {
        self.banner.write_line(line);
    }

    pub fn write_error(&self, line: &str) {
        self.diagnostics.write_line(line);
    }
}

/// Append to `path`, creating it and any missing parent directories
fn open_append(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the process-wide writer
///
/// Fails if the error log cannot be opened or a writer is already installed.
pub fn init(level: Level, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(level, error_log_file)?;
    LOG_WRITER
        .set(writer)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "logger initialized twice"))
}

/// The installed writer, or `None` before `init`
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
