use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use color_eyre::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use sysmon::eventlog::{EventLog, reborrow};

use crate::commands::{self, Settings};

type Lines = mpsc::UnboundedReceiver<io::Result<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CpuUsage,
    TopProcesses,
    ContinuousMonitoring,
    Exit,
}

impl MenuChoice {
    pub fn from_input(line: &str) -> Option<Self> {
        match line.trim().parse::<u32>().ok()? {
            1 => Some(MenuChoice::CpuUsage),
            2 => Some(MenuChoice::TopProcesses),
            3 => Some(MenuChoice::ContinuousMonitoring),
            4 => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Input {
    Line(String),
    Closed,
    Interrupted,
}

fn write_menu(out: &mut impl Write, settings: &Settings) -> io::Result<()> {
    writeln!(out, "=====================================")?;
    writeln!(out, "    SYSTEM MONITOR - MAIN MENU")?;
    writeln!(out, "=====================================")?;
    writeln!(out, "1. CPU Usage")?;
    writeln!(out, "2. Top {} Processes", settings.top_count)?;
    writeln!(out, "3. Continuous Monitoring")?;
    writeln!(out, "4. Exit")?;
    writeln!(out, "=====================================")?;
    write!(out, "Enter your choice: ")?;
    out.flush()
}

fn clear_screen(out: &mut impl Write, settings: &Settings) -> io::Result<()> {
    if settings.clear_screen {
        execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    }
    Ok(())
}

/// Read stdin lines on a plain thread. The channel closes at end of input.
///
/// A detached thread does not hold up process exit the way a blocking task
/// on the runtime would.
fn spawn_line_reader() -> Lines {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        loop {
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err));
                    break;
                }
            }
        }
    });
    rx
}

/// Next line of input, or an interrupt if a signal lands first.
async fn next_input(lines: &mut Lines, signals: &mut watch::Receiver<u64>) -> io::Result<Input> {
    fn from_reader(line: Option<io::Result<String>>) -> io::Result<Input> {
        match line {
            Some(line) => line.map(Input::Line),
            None => Ok(Input::Closed),
        }
    }

    tokio::select! {
        line = lines.recv() => from_reader(line),
        changed = signals.changed() => match changed {
            Ok(()) => Ok(Input::Interrupted),
            // no listener: only input can end the wait
            Err(_) => from_reader(lines.recv().await),
        },
    }
}

pub async fn run(
    settings: &Settings,
    log: Option<&mut dyn EventLog>,
    signals: watch::Receiver<u64>,
) -> Result<()> {
    let mut lines = spawn_line_reader();
    let mut out = io::stdout();
    run_with(settings, &mut lines, &mut out, log, signals).await
}

/// Numbered menu loop. Sampling failures are shown and the menu comes back;
/// end of input, a signal at a prompt, or a terminal I/O error ends it.
async fn run_with(
    settings: &Settings,
    lines: &mut Lines,
    out: &mut impl Write,
    mut log: Option<&mut dyn EventLog>,
    mut signals: watch::Receiver<u64>,
) -> Result<()> {
    loop {
        clear_screen(out, settings)?;
        write_menu(out, settings)?;

        let line = match next_input(lines, &mut signals).await? {
            Input::Line(line) => line,
            Input::Closed => {
                writeln!(out)?;
                break;
            }
            Input::Interrupted => {
                writeln!(out, "\nInterrupted. Exiting System Monitor.")?;
                break;
            }
        };

        let Some(choice) = MenuChoice::from_input(&line) else {
            writeln!(out, "\nInvalid choice. Please select 1-4.")?;
            tokio::time::sleep(Duration::from_secs(2)).await;
            continue;
        };

        clear_screen(out, settings)?;
        let outcome = match choice {
            MenuChoice::CpuUsage => commands::cpu_report(settings, out, reborrow(&mut log)),
            MenuChoice::TopProcesses => commands::top_report(settings, out, reborrow(&mut log)),
            MenuChoice::ContinuousMonitoring => {
                let result =
                    commands::watch(settings, out, reborrow(&mut log), None, &signals).await;
                // the signal that ended the session is spent
                signals.mark_unchanged();
                result.map(|_| ())
            }
            MenuChoice::Exit => {
                writeln!(out, "\nExiting System Monitor. Goodbye!")?;
                break;
            }
        };
        if let Err(err) = outcome {
            writeln!(out, "Error: {err}")?;
        }

        write!(out, "\nPress Enter to return to menu...")?;
        out.flush()?;
        match next_input(lines, &mut signals).await? {
            Input::Line(_) => {}
            Input::Closed => break,
            Input::Interrupted => {
                writeln!(out, "\nInterrupted. Exiting System Monitor.")?;
                break;
            }
        }
    }

    debug!("menu closed");
    Ok(())
}
