use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::eventlog::EventLog;

use super::error::{Result, SampleError};
use super::procfs::{ProcFs, ProcSource};

/// Steal below this percentage is left out of reports.
pub const STEAL_DISPLAY_THRESHOLD_PCT: f64 = 0.1;

const CPU_FIELDS: usize = 8;

/// Aggregate tick counters from the first line of `/proc/stat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuCounters {
    pub fn active(&self) -> u64 {
        [self.nice, self.system, self.irq, self.softirq]
            .into_iter()
            .fold(self.user, u64::saturating_add)
    }

    pub fn total(&self) -> u64 {
        [self.idle, self.iowait, self.steal]
            .into_iter()
            .fold(self.active(), u64::saturating_add)
    }
}

/// Parse the aggregate `cpu` line: a non-numeric label then eight counters.
pub fn parse_cpu_counters(record: &str) -> Result<CpuCounters> {
    let line = record.lines().next().unwrap_or_default();
    let mut tokens = line.split_whitespace();

    let label = tokens.next().ok_or_else(|| unavailable("empty CPU record"))?;
    if label.parse::<u64>().is_ok() {
        return Err(unavailable(format!("expected a label, found {label:?}")));
    }

    let values: Vec<u64> = tokens
        .take(CPU_FIELDS)
        .map_while(|t| t.parse().ok())
        .collect();
    if values.len() < CPU_FIELDS {
        return Err(unavailable(format!(
            "expected {CPU_FIELDS} counters after {label:?}, parsed {}",
            values.len()
        )));
    }

    Ok(CpuCounters {
        user: values[0],
        nice: values[1],
        system: values[2],
        idle: values[3],
        iowait: values[4],
        irq: values[5],
        softirq: values[6],
        steal: values[7],
    })
}

fn unavailable(reason: impl Into<String>) -> SampleError {
    SampleError::CounterUnavailable {
        reason: reason.into(),
    }
}

/// Utilization derived from two counter samples, as percentages of the
/// elapsed ticks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CpuUsage {
    pub active: f64,
    pub idle: f64,
    pub iowait: f64,
    pub steal: f64,
    /// Denominator used for the percentages; never zero.
    pub delta_total: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<Ser: serde::Serializer>(
    d: &Duration,
    s: Ser,
) -> std::result::Result<Ser::Ok, Ser::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl CpuUsage {
    /// Delta method over `prev` -> `cur`.
    ///
    /// A counter that went backwards (reset or wraparound) contributes zero
    /// rather than an error. No tick movement at all divides by one.
    pub fn between(prev: &CpuCounters, cur: &CpuCounters, elapsed: Duration) -> Self {
        let delta_total = match cur.total().saturating_sub(prev.total()) {
            0 => 1,
            d => d,
        };
        let pct = |delta: u64| 100.0 * delta as f64 / delta_total as f64;

        CpuUsage {
            active: pct(cur.active().saturating_sub(prev.active())),
            idle: pct(cur.idle.saturating_sub(prev.idle)),
            iowait: pct(cur.iowait.saturating_sub(prev.iowait)),
            steal: pct(cur.steal.saturating_sub(prev.steal)),
            delta_total,
            elapsed,
        }
    }

    pub fn steal_visible(&self, threshold_pct: f64) -> bool {
        self.steal > threshold_pct
    }
}

/// Reads aggregate counters and measures utilization over a fixed interval.
pub struct CpuSampler<S> {
    source: S,
    interval: Duration,
}

impl Default for CpuSampler<ProcFs> {
    fn default() -> Self {
        Self::new(ProcFs::default(), Duration::from_secs(1))
    }
}

impl<S: ProcSource> CpuSampler<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        CpuSampler { source, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn read_counters(&self) -> Result<CpuCounters> {
        let record = self.source.read_to_string("stat").map_err(|err| {
            unavailable(format!(
                "cannot read {}/stat: {err}",
                self.source.describe()
            ))
        })?;
        parse_cpu_counters(&record)
    }

    /// Sample, block for the full interval, sample again.
    pub fn measure(&self, log: Option<&mut dyn EventLog>) -> Result<CpuUsage> {
        let result = self.measure_blocking();
        if let Some(log) = log {
            log.record(&describe_measurement(&result));
        }
        result
    }

    fn measure_blocking(&self) -> Result<CpuUsage> {
        let first = self.read_counters()?;
        let started = Instant::now();
        let elapsed = wait_full(started, self.interval);
        let second = self.read_counters()?;
        let usage = CpuUsage::between(&first, &second, elapsed);
        debug!(?usage, "cpu measurement finished");
        Ok(usage)
    }
}

/// Sleep until at least `interval` has passed since `started`, returning the
/// actual elapsed time.
pub fn wait_full(started: Instant, interval: Duration) -> Duration {
    loop {
        let elapsed = started.elapsed();
        if elapsed >= interval {
            return elapsed;
        }
        thread::sleep(interval - elapsed);
    }
}

/// One log line for a measurement outcome.
pub fn describe_measurement(result: &Result<CpuUsage>) -> String {
    match result {
        Ok(usage) => describe_usage(usage),
        Err(err) => describe_failure(err),
    }
}

pub fn describe_usage(usage: &CpuUsage) -> String {
    format!(
        "cpu sample: active {:.1}% idle {:.1}% iowait {:.1}% steal {:.1}% over {:.2}s",
        usage.active,
        usage.idle,
        usage.iowait,
        usage.steal,
        usage.elapsed.as_secs_f64()
    )
}

pub fn describe_failure(err: &SampleError) -> String {
    format!("cpu sample failed: {err}")
}
