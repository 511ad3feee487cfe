//! Log writer module
//!
//! Thread-safe log output to files or stdout/stderr, with a level threshold.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::level::LogLevel;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(File),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => open_log_file(p).map(Self::File),
            None => Ok(fallback),
        }
    }

    fn write_line(&mut self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(f) => {
                let _ = writeln!(f, "{message}");
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    level: LogLevel,
    /// Access log and informational output
    access: Mutex<LogTarget>,
    /// Warnings and errors
    error: Mutex<LogTarget>,
}

impl LogWriter {
    fn new(
        level: LogLevel,
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
    ) -> io::Result<Self> {
        Ok(Self {
            level,
            access: Mutex::new(LogTarget::open(access_log_file, LogTarget::Stdout)?),
            error: Mutex::new(LogTarget::open(error_log_file, LogTarget::Stderr)?),
        })
    }

    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Write to access log
    pub fn write_access(&self, message: &str) {
        if let Ok(mut target) = self.access.lock() {
            target.write_line(message);
        }
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        if let Ok(mut target) = self.error.lock() {
            target.write_line(message);
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// Returns error if log files cannot be opened or the writer is already set.
pub fn init(
    level: LogLevel,
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
) -> io::Result<()> {
    let writer = LogWriter::new(level, access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
