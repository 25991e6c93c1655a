use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::eventlog::{EventLog, reborrow};
use crate::report::{self, OutputFormat};
use crate::system::collector::Collector;
use crate::system::cpu::{CpuSampler, CpuUsage, describe_failure, describe_usage};
use crate::system::error::SampleError;
use crate::system::process::ProcessSample;
use crate::system::procfs::ProcSource;
use crate::system::ranking::{SortKey, rank_by};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub top_count: usize,
    pub sort: SortKey,
    pub format: OutputFormat,
    pub steal_threshold_pct: f64,
    pub clear_screen: bool,
    /// Stop after this many completed iterations; `None` runs until shutdown.
    pub max_iterations: Option<u64>,
}

/// Periodic CPU + top-N report, stopped by a shutdown signal.
///
/// One iteration samples the CPU counters, waits out the interval, samples
/// again, enumerates and ranks processes, writes the rendered frame in one go
/// and logs. A shutdown observed during the wait abandons the iteration before
/// anything is written; after the wait the iteration always runs to the end.
pub struct Monitor<S> {
    source: S,
    settings: MonitorSettings,
}

impl<S: ProcSource> Monitor<S> {
    pub fn new(source: S, settings: MonitorSettings) -> Self {
        Monitor { source, settings }
    }

    /// Returns the number of completed iterations.
    pub async fn run(
        &self,
        out: &mut impl Write,
        mut log: Option<&mut dyn EventLog>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<u64, MonitorError> {
        let collector = Collector::new(&self.source);
        let sampler = CpuSampler::new(&self.source, self.settings.interval);
        let mut completed = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Some(max) = self.settings.max_iterations
                && completed >= max
            {
                break;
            }

            let usage = match measure(&sampler, &mut shutdown).await {
                Ok(Some(usage)) => usage,
                Ok(None) => {
                    info!(completed, "monitor interrupted during sampling interval");
                    break;
                }
                Err(err) => {
                    if let Some(log) = reborrow(&mut log) {
                        log.record(&describe_failure(&err));
                    }
                    return Err(err.into());
                }
            };

            let snapshot = collector.snapshot(reborrow(&mut log))?;
            let ranked = rank_by(snapshot, self.settings.sort, self.settings.top_count);

            let mut frame = Vec::new();
            self.render_frame(&mut frame, completed + 1, &usage, &ranked)?;
            out.write_all(&frame)?;
            out.flush()?;

            if let Some(log) = reborrow(&mut log) {
                log.record(&describe_usage(&usage));
            }
            completed += 1;
            debug!(completed, "monitor iteration finished");
        }

        Ok(completed)
    }

    fn render_frame(
        &self,
        frame: &mut Vec<u8>,
        iteration: u64,
        usage: &CpuUsage,
        ranked: &[ProcessSample],
    ) -> io::Result<()> {
        let settings = &self.settings;
        if settings.format == OutputFormat::Json {
            return report::write_frame_json(frame, iteration, usage, ranked);
        }

        if settings.clear_screen {
            queue!(frame, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        report::write_heading(frame, &format!("Continuous Monitoring (#{iteration})"))?;
        report::write_heading(frame, "CPU Usage")?;
        report::write_cpu_table(frame, usage, settings.steal_threshold_pct)?;
        writeln!(frame)?;
        report::write_heading(
            frame,
            &format!(
                "Top {} Processes by {}",
                settings.top_count,
                settings.sort.label()
            ),
        )?;
        report::write_process_table(frame, ranked)?;
        writeln!(frame, "\nPress Ctrl+C to stop.")
    }
}

/// Two counter reads separated by the full interval. `Ok(None)` means a
/// shutdown arrived while waiting.
async fn measure<S: ProcSource>(
    sampler: &CpuSampler<S>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Option<CpuUsage>, SampleError> {
    let first = sampler.read_counters()?;
    let started = Instant::now();
    if !wait_interval(started, sampler.interval(), shutdown).await {
        return Ok(None);
    }
    let elapsed = started.elapsed();
    let second = sampler.read_counters()?;
    Ok(Some(CpuUsage::between(&first, &second, elapsed)))
}

/// Sleep until `interval` has elapsed since `started`. Returns false if
/// shutdown was requested (or its sender dropped) first.
async fn wait_interval(
    started: Instant,
    interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        let elapsed = started.elapsed();
        if elapsed >= interval {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval - elapsed) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}
