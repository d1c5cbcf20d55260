//! Progress log - timestamped status lines appended to a plain text file

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// e.g. `2024-Mar-05-14:07:09`
pub const TIMESTAMP_FORMAT: &str = "%Y-%h-%d-%H:%M:%S";

#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a pipeline milestone. Best-effort: a failed write is reported
    /// through tracing and never stops the pipeline.
    pub fn log(&self, message: &str) {
        info!("{}", message);

        if let Err(e) = self.append(Local::now(), message) {
            warn!("Failed to write progress log {:?}: {}", self.path, e);
        }
    }

    /// Append `<timestamp> : <message>`; the file is opened and released per call
    pub fn append(&self, at: DateTime<Local>, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{}", format_line(at, message))
    }
}

pub fn format_line(at: DateTime<Local>, message: &str) -> String {
    format!("{} : {}", at.format(TIMESTAMP_FORMAT), message)
}
