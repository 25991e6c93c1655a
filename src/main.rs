mod commands;
mod menu;

use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;

use commands::Settings;
use sysmon::config::{self, MIN_INTERVAL_SECS, load_config, load_config_from_path};
use sysmon::eventlog::{EventLog, FileEventLog};
use sysmon::logging::init_tracing;
use sysmon::report::OutputFormat;
use sysmon::system::ranking::SortKey;

#[derive(Parser)]
#[command(
    name = "sysmon",
    version,
    about = "Process and CPU monitor for the Linux /proc filesystem"
)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the process registry
    #[arg(long, global = true)]
    proc_root: Option<PathBuf>,

    /// Sampling interval in seconds (at least 1)
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Report format
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Append one line per sampling event to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Diagnostic verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Measure CPU utilization over one interval
    Cpu,
    /// Rank processes by accumulated CPU ticks
    Top {
        /// Number of processes to show (at least 1)
        #[arg(short = 'n', long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        count: Option<usize>,

        /// Tick counter to rank by
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
    },
    /// Report CPU usage and top processes every interval until interrupted
    Watch {
        /// Stop after this many reports
        #[arg(long)]
        iterations: Option<u64>,

        /// Keep previous reports on screen
        #[arg(long, default_value_t = false)]
        no_clear: bool,
    },
    /// Interactive numbered menu (the default)
    Menu,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = load_config_for_cli(&cli);
    let mut settings = settings_for_cli(&config, &cli);

    let mut event_log = match &settings.log_file {
        Some(path) => Some(
            FileEventLog::open(path)
                .wrap_err_with(|| format!("cannot open event log {}", path.display()))?,
        ),
        None => None,
    };
    let log = event_log.as_mut().map(|l| l as &mut dyn EventLog);

    let mut out = stdout();
    match cli.command.unwrap_or(Command::Menu) {
        Command::Cpu => commands::cpu_report(&settings, &mut out, log)?,
        Command::Top { count, sort } => {
            if let Some(count) = count {
                settings.top_count = count;
            }
            if let Some(sort) = sort {
                settings.sort = sort;
            }
            commands::top_report(&settings, &mut out, log)?;
        }
        Command::Watch {
            iterations,
            no_clear,
        } => {
            if no_clear {
                settings.clear_screen = false;
            }
            let signals = commands::listen_for_signals();
            commands::watch(&settings, &mut out, log, iterations, &signals).await?;
        }
        Command::Menu => menu::run(&settings, log, commands::listen_for_signals()).await?,
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    }
}

fn settings_for_cli(config: &config::Config, cli: &Cli) -> Settings {
    let mut settings = Settings::from_config(config);

    if let Some(ref root) = cli.proc_root {
        settings.proc_root = root.clone();
    }
    if let Some(secs) = cli.interval {
        settings.interval = Duration::from_secs(secs.max(MIN_INTERVAL_SECS));
    }
    if let Some(format) = cli.format {
        settings.format = format;
    }
    if let Some(ref path) = cli.log_file {
        settings.log_file = Some(path.clone());
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "sysmon",
            "--proc-root",
            "/host/proc",
            "--interval",
            "0",
            "--format",
            "json",
            "top",
            "-n",
            "3",
        ]);
        let settings = settings_for_cli(&config::Config::default(), &cli);
        assert_eq!(settings.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Some(Command::Top {
                count: Some(3),
                sort: None
            })
        ));
    }

    #[test]
    fn no_subcommand_means_menu() {
        let cli = Cli::parse_from(["sysmon"]);
        assert!(cli.command.is_none());
        let settings = settings_for_cli(&config::Config::default(), &cli);
        assert_eq!(settings.top_count, 5);
    }

    #[test]
    fn zero_top_count_is_rejected() {
        assert!(Cli::try_parse_from(["sysmon", "top", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["sysmon", "top", "-n", "1"]).is_ok());
    }

    #[test]
    fn watch_flags_parse() {
        let cli = Cli::parse_from(["sysmon", "watch", "--iterations", "2", "--no-clear"]);
        assert!(matches!(
            cli.command,
            Some(Command::Watch {
                iterations: Some(2),
                no_clear: true
            })
        ));
    }
}
