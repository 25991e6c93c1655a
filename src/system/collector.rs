use tracing::debug;

use crate::eventlog::EventLog;

use super::error::{Result, SampleError};
use super::process::read_process;
use super::procfs::{ProcFs, ProcSource};
use super::snapshot::Snapshot;

/// Walks the process registry and builds snapshots.
pub struct Collector<S> {
    source: S,
}

impl Default for Collector<ProcFs> {
    fn default() -> Self {
        Self::new(ProcFs::default())
    }
}

impl<S: ProcSource> Collector<S> {
    pub fn new(source: S) -> Self {
        Collector { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Enumerate every numeric registry entry and read its accounting record.
    ///
    /// Processes that exit mid-scan are dropped and counted in
    /// [`Snapshot::skipped`]. Only an unlistable root is an error.
    pub fn snapshot(&self, log: Option<&mut dyn EventLog>) -> Result<Snapshot> {
        let result = self.build_snapshot();
        if let Some(log) = log {
            match &result {
                Ok(snapshot) => log.record(&format!(
                    "enumerated {} processes ({} skipped)",
                    snapshot.len(),
                    snapshot.skipped
                )),
                Err(err) => log.record(&format!("process enumeration failed: {err}")),
            }
        }
        result
    }

    fn build_snapshot(&self) -> Result<Snapshot> {
        let entries =
            self.source
                .list_entries()
                .map_err(|source| SampleError::EnumerationUnavailable {
                    path: self.source.describe(),
                    source,
                })?;

        let pids: Vec<u32> = entries
            .iter()
            .filter(|name| is_pid_entry(name))
            .filter_map(|name| name.parse().ok())
            .collect();

        let mut processes = Vec::new();
        processes.try_reserve(pids.len())?;
        let mut skipped = 0;

        for pid in pids {
            match read_process(&self.source, pid) {
                Ok(sample) => processes.push(sample),
                Err(err) => {
                    debug!(pid, %err, "skipping process");
                    skipped += 1;
                }
            }
        }

        debug!(
            found = processes.len(),
            skipped,
            root = %self.source.describe(),
            "process enumeration finished"
        );
        Ok(Snapshot { processes, skipped })
    }
}

/// Process directories are named by their pid and nothing else.
fn is_pid_entry(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventlog::MemoryEventLog;
    use crate::system::procfs::MockProcFs;

    #[test]
    fn pid_entries_are_purely_numeric() {
        assert!(is_pid_entry("1"));
        assert!(is_pid_entry("40213"));
        assert!(!is_pid_entry(""));
        assert!(!is_pid_entry("self"));
        assert!(!is_pid_entry("1a"));
        assert!(!is_pid_entry("-1"));
        assert!(!is_pid_entry("+5"));
    }

    #[test]
    fn non_process_entries_are_ignored() {
        let fs = MockProcFs::new()
            .with_process(1, "init", 10, 5)
            .with_process(200, "sshd", 3, 4)
            .with_file("stat", "cpu 1 2 3 4 5 6 7 8")
            .with_entry("self")
            .with_entry("sys");
        let snapshot = Collector::new(fs).snapshot(None).unwrap();
        let mut pids: Vec<u32> = snapshot.iter().map(|p| p.pid()).collect();
        pids.sort_unstable();
        assert_eq!(pids, vec![1, 200]);
        assert_eq!(snapshot.skipped, 0);
    }

    #[test]
    fn truncated_record_is_skipped_and_others_survive() {
        let fs = MockProcFs::new()
            .with_process(1, "init", 10, 5)
            .with_process(2, "kthreadd", 0, 7)
            .with_file("3/comm", "short\n")
            .with_file("3/stat", "3 (short) S 1 3 3 0 -1 0 0");
        let snapshot = Collector::new(fs).snapshot(None).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.skipped, 1);
        assert!(snapshot.iter().all(|p| p.pid() != 3));
    }

    #[test]
    fn vanished_directory_is_skipped() {
        let fs = MockProcFs::new()
            .with_process(1, "init", 10, 5)
            .with_entry("999");
        let snapshot = Collector::new(fs).snapshot(None).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.skipped, 1);
    }

    #[test]
    fn empty_registry_is_empty_snapshot() {
        let fs = MockProcFs::new().with_entry("self");
        let snapshot = Collector::new(fs).snapshot(None).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn unlistable_root_is_hard_failure() {
        let fs = MockProcFs::new().with_process(1, "init", 1, 1).unlistable();
        let mut log = MemoryEventLog::default();
        let err = Collector::new(fs).snapshot(Some(&mut log)).unwrap_err();
        assert!(matches!(err, SampleError::EnumerationUnavailable { .. }));
        assert_eq!(log.lines().len(), 1);
        assert!(log.lines()[0].starts_with("process enumeration failed"));
    }

    #[test]
    fn outcome_is_logged_once() {
        let fs = MockProcFs::new()
            .with_process(1, "init", 1, 1)
            .with_entry("77");
        let mut log = MemoryEventLog::default();
        Collector::new(fs).snapshot(Some(&mut log)).unwrap();
        assert_eq!(log.lines(), ["enumerated 1 processes (1 skipped)"]);
    }
}
