//! Live Log
//!
//! One progress line per in-flight action. On a terminal the whole block is
//! redrawn in place whenever an entry changes; otherwise every change is
//! appended as a new line. Screen order is creation order. Redrawn lines are
//! cut to the terminal width so each entry takes exactly one row.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

/// Status of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Created, request not sent yet
    Pending,
    /// Request sent or waiting for a state
    InProgress,
    Done,
    Failed,
}

impl EntryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "◯",
            Self::InProgress => "↻",
            Self::Done => "✓",
            Self::Failed => "✗",
        }
    }
}

#[derive(Debug, Clone)]
struct EntryState {
    message: String,
    details: Option<String>,
    status: EntryStatus,
    started_at: Option<DateTime<Local>>,
    started: Option<Instant>,
    finished: Option<Instant>,
}

impl EntryState {
    fn new(message: String) -> Self {
        Self {
            message,
            details: None,
            status: EntryStatus::Pending,
            started_at: None,
            started: None,
            finished: None,
        }
    }

    fn duration(&self) -> Option<Duration> {
        let started = self.started?;
        Some(self.finished.unwrap_or_else(Instant::now).duration_since(started))
    }

    fn render(&self) -> String {
        let mut line = format!("{} {}", self.status.icon(), self.message);
        if let Some(started_at) = self.started_at {
            line = format!("{} [{}]", line, started_at.format("%H:%M:%S"));
        }
        if self.status.is_terminal() {
            if let Some(d) = self.duration() {
                line = format!("{} ({})", line, duration_display(d));
            }
        }
        if let Some(details) = &self.details {
            line = format!("{} - {}", line, details);
        }
        line
    }
}

/// Format duration for display
fn duration_display(d: Duration) -> String {
    if d.as_secs() < 1 {
        format!("{}ms", d.as_millis())
    } else if d.as_secs() < 60 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}

/// Cut `line` short of `columns` so the terminal never wraps it
fn fit_width(line: &str, columns: usize) -> &str {
    let max = columns.saturating_sub(1).max(1);
    match line.char_indices().nth(max) {
        Some((cut, _)) => &line[..cut],
        None => line,
    }
}

/// Read-only copy of an entry, for callers and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub message: String,
    pub details: Option<String>,
    pub status: EntryStatus,
}

struct Inner {
    entries: Vec<EntryState>,
    out: Box<dyn Write + Send>,
    interactive: bool,
    rendered_lines: usize,
    // fixed width; the terminal is queried when unset
    columns: Option<usize>,
}

impl Inner {
    fn render(&mut self, changed: usize) {
        let result = if self.interactive {
            self.redraw()
        } else {
            match self.entries.get(changed) {
                Some(entry) => writeln!(self.out, "{}", entry.render()),
                None => Ok(()),
            }
        };
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            tracing::debug!("Failed to write live log: {}", e);
        }
    }

    fn redraw(&mut self) -> std::io::Result<()> {
        if self.rendered_lines > 0 {
            let lines = u16::try_from(self.rendered_lines).unwrap_or(u16::MAX);
            queue!(
                self.out,
                MoveToPreviousLine(lines),
                Clear(ClearType::FromCursorDown)
            )?;
        }
        let columns = self.columns.or_else(|| {
            crossterm::terminal::size()
                .ok()
                .map(|(columns, _)| usize::from(columns))
        });
        for entry in &self.entries {
            let line = entry.render();
            match columns {
                Some(columns) => writeln!(self.out, "{}", fit_width(&line, columns))?,
                None => writeln!(self.out, "{}", line)?,
            }
        }
        self.rendered_lines = self.entries.len();
        Ok(())
    }
}

/// Concurrent progress reporter shared by all items of a batch
#[derive(Clone)]
pub struct LiveLog {
    inner: Arc<Mutex<Inner>>,
}

impl LiveLog {
    pub fn new(out: Box<dyn Write + Send>, interactive: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: Vec::new(),
                out,
                interactive,
                rendered_lines: 0,
                columns: None,
            })),
        }
    }

    /// Log to stderr, redrawing in place when it is a terminal
    pub fn stderr() -> Self {
        let interactive = std::io::stderr().is_terminal();
        Self::new(Box::new(std::io::stderr()), interactive)
    }

    /// Add an entry at the bottom of the log
    pub fn new_entry(&self, message: impl Into<String>) -> LogEntry {
        let mut inner = self.lock();
        inner.entries.push(EntryState::new(message.into()));
        let index = inner.entries.len() - 1;
        inner.render(index);
        LogEntry {
            log: self.clone(),
            index,
        }
    }

    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.lock()
            .entries
            .iter()
            .map(|e| EntrySnapshot {
                message: e.message.clone(),
                details: e.details.clone(),
                status: e.status,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one line of a [`LiveLog`]
#[derive(Clone)]
pub struct LogEntry {
    log: LiveLog,
    index: usize,
}

impl LogEntry {
    /// Stamp the start time
    pub fn started_now(&self) {
        self.update(|e| {
            e.started_at = Some(Local::now());
            e.started = Some(Instant::now());
            e.status = EntryStatus::InProgress;
        });
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|e| e.message = message);
    }

    pub fn set_details(&self, details: &str, prefix: &str) {
        let details = format!("{prefix}{details}");
        self.update(|e| e.details = Some(details));
    }

    /// Freeze the entry as successful
    pub fn mark_done(&self) {
        self.update(|e| {
            e.status = EntryStatus::Done;
            e.finished = Some(Instant::now());
        });
    }

    /// Freeze the entry as failed, showing `error` as its details
    pub fn mark_failed(&self, error: &dyn std::fmt::Display) {
        let details = format!("error: {error}");
        self.update(|e| {
            e.status = EntryStatus::Failed;
            e.details = Some(details);
            e.finished = Some(Instant::now());
        });
    }

    pub fn status(&self) -> Option<EntryStatus> {
        self.log.lock().entries.get(self.index).map(|e| e.status)
    }

    // Terminal entries ignore further updates
    fn update(&self, f: impl FnOnce(&mut EntryState)) {
        let mut inner = self.log.lock();
        match inner.entries.get_mut(self.index) {
            Some(entry) if !entry.status.is_terminal() => f(entry),
            _ => return,
        }
        inner.render(self.index);
    }
}
