use color_eyre::eyre::{Result, eyre};
use tracing::Level;

/// Map `-v` repetitions to a level; diagnostics default to warnings only.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install a stderr fmt subscriber so diagnostics never mix with reports on stdout.
pub fn init_tracing(verbosity: u8) -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}
