use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Result type alias for sampling operations.
pub type Result<T> = std::result::Result<T, SampleError>;

/// Errors raised while reading the process registry or CPU counters.
#[derive(Error, Debug)]
pub enum SampleError {
    /// One process's accounting record could not be read. Enumeration skips it.
    #[error("process {pid} vanished before its accounting record could be read")]
    ProcessVanished {
        /// Process id whose record was unavailable
        pid: u32,
    },

    /// The registry root itself could not be listed.
    #[error("cannot list process registry at {path}: {source}")]
    EnumerationUnavailable {
        /// Registry root that failed to open
        path: String,
        #[source]
        source: io::Error,
    },

    /// The aggregate CPU record is missing or malformed.
    #[error("CPU counters unavailable: {reason}")]
    CounterUnavailable {
        /// What went wrong while reading or parsing the record
        reason: String,
    },

    /// Growing the snapshot failed.
    #[error("out of memory while building snapshot: {0}")]
    ResourceExhausted(#[from] TryReserveError),
}

impl SampleError {
    /// Whether the error only concerns a single process entry.
    pub fn is_per_process(&self) -> bool {
        matches!(self, SampleError::ProcessVanished { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_vanished_is_per_process() {
        assert!(SampleError::ProcessVanished { pid: 7 }.is_per_process());
        let err = SampleError::CounterUnavailable {
            reason: "short record".into(),
        };
        assert!(!err.is_per_process());
    }

    #[test]
    fn enumeration_error_names_the_path() {
        let err = SampleError::EnumerationUnavailable {
            path: "/nope".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope"), "{msg}");
        assert!(msg.contains("missing"), "{msg}");
    }
}
