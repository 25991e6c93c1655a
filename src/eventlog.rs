use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Receiver for one descriptive line per sampling event.
///
/// Sinks own timestamping and persistence; callers pass bare messages.
pub trait EventLog {
    fn record(&mut self, message: &str);
}

/// Borrow an optional sink again without giving up the original.
pub fn reborrow<'a>(log: &'a mut Option<&mut dyn EventLog>) -> Option<&'a mut dyn EventLog> {
    match log {
        Some(log) => Some(&mut **log),
        None => None,
    }
}

/// Append-only log file. Each line is prefixed with the local time.
#[derive(Debug)]
pub struct FileEventLog {
    file: File,
    path: PathBuf,
}

impl FileEventLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileEventLog {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLog for FileEventLog {
    fn record(&mut self, message: &str) {
        let line = format!("[{}] {message}\n", Local::now().format(TIMESTAMP_FORMAT));
        if let Err(err) = self
            .file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
        {
            warn!(path = %self.path.display(), %err, "failed to append to event log");
        }
    }
}

/// Keeps lines in memory, without timestamps.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventLog {
    lines: Vec<String>,
}

impl MemoryEventLog {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl EventLog for MemoryEventLog {
    fn record(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}
