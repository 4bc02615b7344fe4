use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{LogEntry, LogSink};
use crate::error::{HelmError, Result};

/// Appends to a log file, reopening it on every call so external readers
/// always see complete lines.
#[derive(Debug, Clone)]
pub struct FileLogSink {
    path: PathBuf,
    console: bool,
}

impl FileLogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            console: true,
        }
    }

    /// Toggle the stdout mirror.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl LogSink for FileLogSink {
    fn log(&self, message: &str) -> Result<()> {
        let line = LogEntry::now(message).to_line();

        self.append(&line)
            .map_err(|e| HelmError::LogSink(format!("failed to append to {}: {}", self.path.display(), e)))?;

        if self.console {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(line.as_bytes());
            let _ = stdout.flush();
        }
        Ok(())
    }
}
