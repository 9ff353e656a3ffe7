use std::{fmt::Write as _, path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast::error::RecvError, watch},
};

use crate::{
    error::FocusError,
    lifecycle::{ForegroundState, LifecycleMonitor},
    models::{Category, SessionRecord},
    reports::Report,
    settings::TimerDefaults,
    timer::{RecordOutcome, SkipReason, TimerEvent, TimerSnapshot, TimerStatus},
    utils::format_mmss,
    AppState,
};

/// focus timer that notices when you wander off
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// directory holding the session database and settings
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// run the interactive timer (default)
    Focus {
        /// countdown length in minutes (5-60, steps of 5)
        #[arg(short, long)]
        minutes: Option<u32>,

        /// category to record the session under
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// today, all-time, 7-day trend and category breakdown
    Report {
        /// print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// recorded sessions, newest first
    History {
        /// show at most this many sessions
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// delete every recorded session
    Clear {
        /// confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// show or change the timer defaults
    Config {
        #[arg(short, long)]
        minutes: Option<u32>,

        #[arg(short, long)]
        category: Option<Category>,
    },
}

/// A line typed into the interactive timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Pause,
    Reset,
    MoreTime,
    LessTime,
    DefaultTime,
    SetCategory(Category),
    Away,
    Back,
    Status,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let rest = words.collect::<Vec<_>>().join(" ");

        let action = match verb.as_str() {
            "start" | "s" => Action::Start,
            "pause" | "p" => Action::Pause,
            "reset" | "r" => Action::Reset,
            "+" | "+5" => Action::MoreTime,
            "-" | "-5" => Action::LessTime,
            "default" | "25" => Action::DefaultTime,
            "category" | "c" => {
                if rest.is_empty() {
                    bail!("usage: category <{}>", category_names());
                }
                Action::SetCategory(rest.parse()?)
            }
            "away" | "bg" => Action::Away,
            "back" | "fg" => Action::Back,
            "status" | "" => Action::Status,
            "help" | "?" => Action::Help,
            "quit" | "q" | "exit" => Action::Quit,
            other => return Err(anyhow!("unknown command '{other}', type 'help'")),
        };
        Ok(action)
    }
}

fn category_names() -> String {
    Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

const HELP: &str = "commands: start, pause, reset, + / - (5 min), default, \
category <name>, away, back, status, quit";

pub async fn dispatch(app: AppState, command: Command) -> Result<()> {
    match command {
        Command::Focus { minutes, category } => focus(&app, minutes, category).await,
        Command::Report { json } => {
            let report = app.reports.report().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report));
            }
            Ok(())
        }
        Command::History { limit } => {
            let history = app.reports.history().await;
            let shown = limit.unwrap_or(history.len());
            print!("{}", render_history(&history[..shown.min(history.len())]));
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to delete the session log without --yes");
            }
            app.log.clear().await?;
            println!("Session log cleared.");
            Ok(())
        }
        Command::Config { minutes, category } => {
            let current = app.settings.timer_defaults();
            let defaults = if minutes.is_none() && category.is_none() {
                current
            } else {
                app.settings.update_timer_defaults(TimerDefaults {
                    default_minutes: minutes.unwrap_or(current.default_minutes),
                    default_category: category.unwrap_or(current.default_category),
                })?
            };
            println!(
                "default duration: {} min\ndefault category: {}\nsettings file: {}",
                defaults.default_minutes,
                defaults.default_category,
                app.settings.path().display()
            );
            Ok(())
        }
    }
}

async fn focus(app: &AppState, minutes: Option<u32>, category: Option<Category>) -> Result<()> {
    let timer = &app.timer;
    if let Some(minutes) = minutes {
        timer.set_minutes(i64::from(minutes)).await?;
    }
    if let Some(category) = category {
        timer.set_category(category).await?;
    }

    let (signal_tx, signal_rx) = watch::channel(ForegroundState::Active);
    let mut monitor = LifecycleMonitor::new();
    monitor.start(timer.clone(), signal_rx)?;

    let mut events = timer.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut host_signals = HostSignals::new()?;

    println!("{HELP}");
    println!("{}", render_snapshot(&timer.get_snapshot().await));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match line.parse::<Action>() {
                    Ok(Action::Quit) => break,
                    Ok(action) => apply(app, &signal_tx, action).await,
                    Err(err) => println!("{err}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = render_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            next = host_signals.recv() => {
                signal_tx.send_replace(next);
            }
        }
    }

    monitor.stop().await?;
    timer.shutdown().await;
    Ok(())
}

async fn apply(app: &AppState, signal_tx: &watch::Sender<ForegroundState>, action: Action) {
    let timer = &app.timer;
    let result = match action {
        Action::Start => timer.start().await.map(|_| ()),
        Action::Pause => timer.pause().await.map(|outcome| {
            if outcome == RecordOutcome::Skipped(SkipReason::Empty) {
                println!("Nothing focused yet, no session recorded.");
            }
        }),
        Action::Reset => {
            timer.reset().await;
            Ok(())
        }
        Action::MoreTime => timer.step_minutes(5).await.map(|_| ()),
        Action::LessTime => timer.step_minutes(-5).await.map(|_| ()),
        Action::DefaultTime => timer.reset_minutes().await.map(|_| ()),
        Action::SetCategory(category) => timer.set_category(category).await.map(|_| ()),
        Action::Away => {
            signal_tx.send_replace(ForegroundState::Background);
            Ok(())
        }
        Action::Back => {
            signal_tx.send_replace(ForegroundState::Active);
            Ok(())
        }
        Action::Status => {
            println!("{}", render_snapshot(&timer.get_snapshot().await));
            Ok(())
        }
        Action::Help => {
            println!("{HELP}");
            Ok(())
        }
        Action::Quit => Ok(()),
    };

    match result {
        Ok(()) => {}
        // Recording failures already arrive as RecordFailed events.
        Err(FocusError::StorageWrite(_)) => {}
        Err(err) => println!("{err}"),
    }
}

/// OS-level stand-in for the host lifecycle: SIGUSR1 means the user left,
/// SIGUSR2 means they came back.
#[cfg(unix)]
struct HostSignals {
    away: tokio::signal::unix::Signal,
    back: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl HostSignals {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            away: signal(SignalKind::user_defined1()).context("failed to listen for SIGUSR1")?,
            back: signal(SignalKind::user_defined2()).context("failed to listen for SIGUSR2")?,
        })
    }

    async fn recv(&mut self) -> ForegroundState {
        tokio::select! {
            _ = self.away.recv() => ForegroundState::Background,
            _ = self.back.recv() => ForegroundState::Active,
        }
    }
}

#[cfg(not(unix))]
struct HostSignals;

#[cfg(not(unix))]
impl HostSignals {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> ForegroundState {
        std::future::pending().await
    }
}

pub fn render_snapshot(snapshot: &TimerSnapshot) -> String {
    let state = &snapshot.state;
    let status = match state.status {
        TimerStatus::Idle => "idle",
        TimerStatus::Running => "running",
    };
    format!(
        "[{status}] {} | {} min | {} | distractions: {}",
        snapshot.remaining, state.configured_minutes, state.category, state.distraction_count
    )
}

fn render_event(event: &TimerEvent) -> Option<String> {
    match event {
        TimerEvent::StateChanged(snapshot) => Some(render_snapshot(snapshot)),
        TimerEvent::Heartbeat(snapshot) => Some(format!("  {} left", snapshot.remaining)),
        TimerEvent::SessionRecorded(summary) => Some(summary.to_string()),
        TimerEvent::RecordFailed(reason) => Some(format!("warning: session not saved ({reason})")),
    }
}

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Today:              {}", format_mmss(saturate(report.today_seconds)));
    let _ = writeln!(
        out,
        "All time:           {}",
        format_mmss(saturate(report.all_time.focused_seconds))
    );
    let _ = writeln!(out, "Total distractions: {}", report.all_time.distractions);
    let _ = writeln!(out, "Sessions:           {}", report.session_count);

    let _ = writeln!(out, "\nLast 7 days (min)");
    for bucket in &report.last_7_days {
        let _ = writeln!(out, "  {}  {:>4}", bucket.label, bucket.minutes);
    }

    let _ = writeln!(out, "\nBy category");
    if report.by_category.is_empty() {
        let _ = writeln!(out, "  no sessions yet");
    }
    for slice in &report.by_category {
        let _ = writeln!(
            out,
            "  {}. {:<16} {:>4} min {:>4}%",
            slice.rank + 1,
            slice.name,
            slice.minutes,
            slice.rounded_percentage()
        );
    }
    out
}

pub fn render_history(records: &[SessionRecord]) -> String {
    if records.is_empty() {
        return "No sessions recorded.\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{}  {}  {:<12} distractions: {}",
            record.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            format_mmss(record.focused_seconds),
            record.category_label(),
            record.distractions
        );
    }
    out
}

fn saturate(seconds: u64) -> u32 {
    u32::try_from(seconds).unwrap_or(u32::MAX)
}
