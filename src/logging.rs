//! Subscriber setup. The TUI owns the terminal, so logs normally go to a
//! size-capped file.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Size at which the log file is moved aside to `<path>.1`.
pub const LOG_ROTATE_BYTES: u64 = 1024 * 1024;

/// Install the global subscriber. `None` logs to stderr.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("zerostart=info".parse()?);

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            }
            let file = RotatingLog::open(path, LOG_ROTATE_BYTES)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Append-only log file that keeps one backup. A write that would push the
/// file past `limit` first renames it to `<path>.1`, replacing any older
/// backup.
pub struct RotatingLog {
    path: PathBuf,
    limit: u64,
    file: File,
    written: u64,
}

impl RotatingLog {
    pub fn open(path: &Path, limit: u64) -> io::Result<Self> {
        let file = Self::append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            limit,
            file,
            written,
        })
    }

    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".1");
        PathBuf::from(name)
    }

    fn append(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, Self::backup_path(&self.path))?;
        self.file = Self::append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // An empty file always takes the write, even one larger than the limit.
        if self.written > 0 && self.written + buf.len() as u64 > self.limit {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
