use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::report::OutputFormat;
use crate::system::cpu::STEAL_DISPLAY_THRESHOLD_PCT;
use crate::system::procfs::DEFAULT_PROC_ROOT;
use crate::system::ranking::SortKey;

/// Shortest sampling interval accepted, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Smallest ranking size; an empty table is reserved for an empty registry.
pub const MIN_TOP_COUNT: usize = 1;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub cpu: CpuConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub interval_secs: u64,
    pub top_count: usize,
    pub sort: String,
    pub format: String,
    pub proc_root: PathBuf,
    pub clear_screen: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_secs: 1,
            top_count: 5,
            sort: "total".to_string(),
            format: "table".to_string(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            clear_screen: true,
        }
    }
}

impl GeneralConfig {
    /// Configured interval, raised to [`MIN_INTERVAL_SECS`] if lower.
    pub fn interval(&self) -> Duration {
        if self.interval_secs < MIN_INTERVAL_SECS {
            warn!(
                configured = self.interval_secs,
                "sampling interval below {MIN_INTERVAL_SECS}s, clamping"
            );
        }
        Duration::from_secs(self.interval_secs.max(MIN_INTERVAL_SECS))
    }

    pub fn top_count(&self) -> usize {
        if self.top_count < MIN_TOP_COUNT {
            warn!(
                configured = self.top_count,
                "top_count below {MIN_TOP_COUNT}, clamping"
            );
        }
        self.top_count.max(MIN_TOP_COUNT)
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::from_str_config(&self.sort)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_str_config(&self.format)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub steal_threshold_pct: f64,
}

impl Default for CpuConfig {
    fn default() -> Self {
        CpuConfig {
            steal_threshold_pct: STEAL_DISPLAY_THRESHOLD_PCT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append-only event log; nothing is logged when unset.
    pub file: Option<PathBuf>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "invalid config, using defaults");
            Config::default()
        }),
        Err(err) => {
            warn!(path = %path.display(), %err, "unreadable config, using defaults");
            Config::default()
        }
    }
}
