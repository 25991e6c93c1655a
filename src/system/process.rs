use tracing::trace;

use super::error::{Result, SampleError};
use super::procfs::ProcSource;

/// Longest process name kept, in characters. Longer names are cut, not rejected.
pub const MAX_NAME_CHARS: usize = 255;

pub const UNKNOWN_NAME: &str = "unknown";

/// CPU accounting for one process at one instant.
///
/// `total_ticks` is derived in the constructor and cannot drift from the two
/// tick fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSample {
    pid: u32,
    name: String,
    user_ticks: u64,
    system_ticks: u64,
    total_ticks: u64,
}

impl ProcessSample {
    pub fn new(pid: u32, name: impl Into<String>, user_ticks: u64, system_ticks: u64) -> Self {
        ProcessSample {
            pid,
            name: truncate_name(name.into()),
            user_ticks,
            system_ticks,
            total_ticks: user_ticks.saturating_add(system_ticks),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user_ticks(&self) -> u64 {
        self.user_ticks
    }

    pub fn system_ticks(&self) -> u64 {
        self.system_ticks
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}

fn truncate_name(mut name: String) -> String {
    if let Some((idx, _)) = name.char_indices().nth(MAX_NAME_CHARS) {
        name.truncate(idx);
    }
    name
}

/// Read `<pid>/comm` and `<pid>/stat` into a sample.
///
/// The name is best effort and falls back to [`UNKNOWN_NAME`]. A missing or
/// short stat record means the process is gone.
pub fn read_process<S: ProcSource + ?Sized>(source: &S, pid: u32) -> Result<ProcessSample> {
    let name = read_name(source, pid);

    let record = source
        .read_to_string(&format!("{pid}/stat"))
        .map_err(|_| SampleError::ProcessVanished { pid })?;
    let (utime, stime) = parse_stat_ticks(&record).ok_or(SampleError::ProcessVanished { pid })?;

    Ok(ProcessSample::new(pid, name, utime, stime))
}

fn read_name<S: ProcSource + ?Sized>(source: &S, pid: u32) -> String {
    match source.read_to_string(&format!("{pid}/comm")) {
        Ok(contents) => {
            let name = contents.strip_suffix('\n').unwrap_or(&contents);
            if name.is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                name.to_string()
            }
        }
        Err(err) => {
            trace!(pid, %err, "comm unreadable");
            UNKNOWN_NAME.to_string()
        }
    }
}

/// Extract utime and stime (fields 14 and 15) from a `/proc/<pid>/stat` record.
///
/// The comm field may contain spaces and parens, so counting restarts after the
/// last `)`. Returns `None` unless both fields parse.
pub fn parse_stat_ticks(record: &str) -> Option<(u64, u64)> {
    // Fields after comm: state(0) ppid(1) pgrp(2) session(3) tty_nr(4)
    // tpgid(5) flags(6) minflt(7) cminflt(8) majflt(9) cmajflt(10)
    // utime(11) stime(12)
    let (rest, utime_idx) = match record.rfind(')') {
        Some(close) => (&record[close + 1..], 11),
        None => (record, 13),
    };
    let mut fields = rest.split_whitespace().skip(utime_idx);
    let utime = fields.next()?.parse().ok()?;
    let stime = fields.next()?.parse().ok()?;
    Some((utime, stime))
}
