use clap::ValueEnum;

use super::process::ProcessSample;
use super::snapshot::Snapshot;

/// Metric a ranking is ordered by, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    #[default]
    Total,
    User,
    System,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Total => "Total Time",
            SortKey::User => "User Time",
            SortKey::System => "System Time",
        }
    }

    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "user" => SortKey::User,
            "system" => SortKey::System,
            _ => SortKey::Total,
        }
    }

    fn ticks(self, sample: &ProcessSample) -> u64 {
        match self {
            SortKey::Total => sample.total_ticks(),
            SortKey::User => sample.user_ticks(),
            SortKey::System => sample.system_ticks(),
        }
    }
}

/// The `n` processes with the most total ticks, highest first.
pub fn top_n(snapshot: Snapshot, n: usize) -> Vec<ProcessSample> {
    rank_by(snapshot, SortKey::Total, n)
}

/// Sort descending by `key` and keep at most `n` entries.
///
/// The sort is unstable: processes with equal ticks come out in no
/// particular order.
pub fn rank_by(snapshot: Snapshot, key: SortKey, n: usize) -> Vec<ProcessSample> {
    let mut processes = snapshot.processes;
    processes.sort_unstable_by(|a, b| key.ticks(b).cmp(&key.ticks(a)));
    processes.truncate(n);
    processes
}
