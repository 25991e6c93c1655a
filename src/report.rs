use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use crate::format::fit_column;
use crate::system::cpu::CpuUsage;
use crate::system::process::ProcessSample;

pub const PID_WIDTH: usize = 8;
pub const NAME_WIDTH: usize = 20;
pub const TICKS_WIDTH: usize = 15;

const RULE_WIDTH: usize = 80;
const CATEGORY_WIDTH: usize = 12;

pub const NO_PROCESSES: &str = "No processes found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

pub fn write_heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "=== {title} ===")?;
    writeln!(out)
}

/// Fixed-column table of ranked processes, or a notice when there are none.
pub fn write_process_table(out: &mut impl Write, rows: &[ProcessSample]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "{NO_PROCESSES}");
    }

    writeln!(
        out,
        "{:<PID_WIDTH$} {:<NAME_WIDTH$} {:<TICKS_WIDTH$} {:<TICKS_WIDTH$} {:<TICKS_WIDTH$}",
        "PID", "Process Name", "User Time", "System Time", "Total Time"
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    for p in rows {
        writeln!(
            out,
            "{:<PID_WIDTH$} {} {:<TICKS_WIDTH$} {:<TICKS_WIDTH$} {:<TICKS_WIDTH$}",
            p.pid(),
            fit_column(p.name(), NAME_WIDTH),
            p.user_ticks(),
            p.system_ticks(),
            p.total_ticks()
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Note: times are in clock ticks (divide by sysconf(_SC_CLK_TCK) for seconds)"
    )
}

/// Category/percent table. Steal is listed only above `steal_threshold_pct`.
pub fn write_cpu_table(
    out: &mut impl Write,
    usage: &CpuUsage,
    steal_threshold_pct: f64,
) -> io::Result<()> {
    writeln!(out, "{:<CATEGORY_WIDTH$} {:>7}", "Category", "Percent")?;
    writeln!(out, "{}", "-".repeat(CATEGORY_WIDTH + 8))?;

    let mut rows = vec![
        ("Active", usage.active),
        ("Idle", usage.idle),
        ("I/O Wait", usage.iowait),
    ];
    if usage.steal_visible(steal_threshold_pct) {
        rows.push(("Steal", usage.steal));
    }
    for (category, pct) in rows {
        writeln!(out, "{category:<CATEGORY_WIDTH$} {pct:>6.1}%")?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Measured over {:.2}s ({} ticks)",
        usage.elapsed.as_secs_f64(),
        usage.delta_total
    )
}

#[derive(Serialize)]
struct ProcessRow<'a> {
    pid: u32,
    name: &'a str,
    user_ticks: u64,
    system_ticks: u64,
    total_ticks: u64,
}

impl<'a> From<&'a ProcessSample> for ProcessRow<'a> {
    fn from(p: &'a ProcessSample) -> Self {
        ProcessRow {
            pid: p.pid(),
            name: p.name(),
            user_ticks: p.user_ticks(),
            system_ticks: p.system_ticks(),
            total_ticks: p.total_ticks(),
        }
    }
}

pub fn write_process_json(out: &mut impl Write, rows: &[ProcessSample]) -> io::Result<()> {
    let rows: Vec<ProcessRow<'_>> = rows.iter().map(ProcessRow::from).collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)
}

pub fn write_cpu_json(out: &mut impl Write, usage: &CpuUsage) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, usage)?;
    writeln!(out)
}

#[derive(Serialize)]
struct Frame<'a> {
    iteration: u64,
    cpu: &'a CpuUsage,
    processes: Vec<ProcessRow<'a>>,
}

/// One monitoring iteration as a single JSON line.
pub fn write_frame_json(
    out: &mut impl Write,
    iteration: u64,
    usage: &CpuUsage,
    rows: &[ProcessSample],
) -> io::Result<()> {
    let frame = Frame {
        iteration,
        cpu: usage,
        processes: rows.iter().map(ProcessRow::from).collect(),
    };
    serde_json::to_writer(&mut *out, &frame)?;
    writeln!(out)
}

pub fn write_processes(
    out: &mut impl Write,
    rows: &[ProcessSample],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => write_process_table(out, rows),
        OutputFormat::Json => write_process_json(out, rows),
    }
}

pub fn write_cpu(
    out: &mut impl Write,
    usage: &CpuUsage,
    format: OutputFormat,
    steal_threshold_pct: f64,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => write_cpu_table(out, usage, steal_threshold_pct),
        OutputFormat::Json => write_cpu_json(out, usage),
    }
}
