use std::convert::Infallible;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use color_eyre::Result;
use tokio::sync::watch;
use tracing::{info, warn};

use sysmon::config::Config;
use sysmon::eventlog::EventLog;
use sysmon::monitor::{Monitor, MonitorSettings};
use sysmon::report::{self, OutputFormat};
use sysmon::system::collector::Collector;
use sysmon::system::cpu::CpuSampler;
use sysmon::system::procfs::ProcFs;
use sysmon::system::ranking::{SortKey, rank_by};

/// Config file values with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub proc_root: PathBuf,
    pub interval: Duration,
    pub top_count: usize,
    pub sort: SortKey,
    pub format: OutputFormat,
    pub steal_threshold_pct: f64,
    pub clear_screen: bool,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Settings {
            proc_root: config.general.proc_root.clone(),
            interval: config.general.interval(),
            top_count: config.general.top_count(),
            sort: config.general.sort_key(),
            format: config.general.output_format(),
            steal_threshold_pct: config.cpu.steal_threshold_pct,
            clear_screen: config.general.clear_screen,
            log_file: config.log.file.clone(),
        }
    }

    fn source(&self) -> ProcFs {
        ProcFs::new(&self.proc_root)
    }
}

pub fn cpu_report(
    settings: &Settings,
    out: &mut impl Write,
    log: Option<&mut dyn EventLog>,
) -> Result<()> {
    let sampler = CpuSampler::new(settings.source(), settings.interval);
    if settings.format == OutputFormat::Table {
        report::write_heading(out, "CPU Usage")?;
        writeln!(
            out,
            "Sampling over {}s...\n",
            settings.interval.as_secs_f64()
        )?;
        out.flush()?;
    }
    let usage = sampler.measure(log)?;
    report::write_cpu(out, &usage, settings.format, settings.steal_threshold_pct)?;
    Ok(())
}

pub fn top_report(
    settings: &Settings,
    out: &mut impl Write,
    log: Option<&mut dyn EventLog>,
) -> Result<()> {
    let snapshot = Collector::new(settings.source()).snapshot(log)?;
    let ranked = rank_by(snapshot, settings.sort, settings.top_count);
    if settings.format == OutputFormat::Table {
        report::write_heading(
            out,
            &format!(
                "Top {} Processes by {}",
                settings.top_count,
                settings.sort.label()
            ),
        )?;
    }
    report::write_processes(out, &ranked, settings.format)?;
    Ok(())
}

/// Run the periodic monitor until a signal arrives or `max_iterations`.
///
/// Only signals received after the call stop this session; `signals` keeps
/// counting for the caller afterwards.
pub async fn watch(
    settings: &Settings,
    out: &mut impl Write,
    log: Option<&mut dyn EventLog>,
    max_iterations: Option<u64>,
    signals: &watch::Receiver<u64>,
) -> Result<u64> {
    let monitor = Monitor::new(
        settings.source(),
        MonitorSettings {
            interval: settings.interval,
            top_count: settings.top_count,
            sort: settings.sort,
            format: settings.format,
            steal_threshold_pct: settings.steal_threshold_pct,
            clear_screen: settings.clear_screen,
            max_iterations,
        },
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut session_signals = signals.clone();
    session_signals.mark_unchanged();
    let forward = async move {
        if session_signals.changed().await.is_ok() {
            let _ = stop_tx.send(true);
        }
        // stop_tx must outlive the monitor or it would read as a shutdown.
        std::future::pending::<Infallible>().await
    };

    let completed = tokio::select! {
        result = monitor.run(out, log, stop_rx) => result?,
        never = forward => match never {},
    };
    info!(completed, "monitoring stopped");
    Ok(completed)
}

/// Count SIGINT/SIGTERM deliveries for the lifetime of the program.
///
/// Installing the handlers replaces the default terminate action, so every
/// interactive loop must watch the returned counter.
pub fn listen_for_signals() -> watch::Receiver<u64> {
    let (tx, rx) = watch::channel(0u64);
    tokio::spawn(async move {
        loop {
            match shutdown_signal().await {
                Ok(()) => {
                    info!("interrupt received");
                    tx.send_modify(|count| *count = count.wrapping_add(1));
                }
                Err(err) => {
                    warn!(%err, "cannot listen for shutdown signals");
                    // Keep the sender alive so listeners are not cancelled.
                    std::future::pending::<()>().await;
                }
            }
        }
    });
    rx
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
