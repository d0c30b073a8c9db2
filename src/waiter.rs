//! State waiter
//!
//! Polls one resource's state until it reaches a target, enters a failure
//! state, or the timeout elapses. The first poll happens immediately; later
//! polls are spaced by the interval. Fetch errors are reported and retried.
//! The timeout also bounds a poll that is still in flight.

use std::future::Future;
use std::time::Duration;

use futures::future::select_all;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::api::format_api_error;
use crate::error::{ApiError, WaitError};
use crate::livelog::LogEntry;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Sending side of a cancellation signal
pub struct CancelHandle(watch::Sender<bool>);

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        Self(watch::Sender::new(false))
    }

    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// A new signal observing this handle
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            sources: vec![self.0.subscribe()],
        }
    }
}

/// Cancellation signal observed by waits. Fires when any of its sources fires.
#[derive(Clone)]
pub struct CancelSignal {
    sources: Vec<watch::Receiver<bool>>,
}

impl CancelSignal {
    pub fn channel() -> (CancelHandle, CancelSignal) {
        let handle = CancelHandle::new();
        let signal = handle.signal();
        (handle, signal)
    }

    /// A signal that fires when either `self` or `other` fires
    pub fn or(&self, other: &CancelSignal) -> CancelSignal {
        let mut sources = self.sources.clone();
        sources.extend(other.sources.iter().cloned());
        CancelSignal { sources }
    }

    pub fn is_cancelled(&self) -> bool {
        self.sources.iter().any(|rx| *rx.borrow())
    }

    /// Resolves once cancelled. A source whose handle is dropped never fires.
    pub async fn cancelled(&self) {
        let waits: Vec<_> = self
            .sources
            .iter()
            .map(|rx| {
                let mut rx = rx.clone();
                async move {
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                .boxed()
            })
            .collect();
        if waits.is_empty() {
            return std::future::pending().await;
        }
        select_all(waits).await;
    }
}

/// Resolves when `cancel` fires; never when there is none
async fn cancelled(cancel: Option<&CancelSignal>) {
    match cancel {
        Some(signal) => signal.cancelled().await,
        None => std::future::pending().await,
    }
}

#[derive(Debug, Clone)]
pub struct StateWaiter {
    pub target: String,
    pub failure_states: Vec<String>,
    pub interval: Duration,
    pub timeout: Duration,
}

impl StateWaiter {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failure_states: Vec::new(),
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    pub fn failure_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_states = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Poll `fetch` until the state settles
    pub async fn wait<F, Fut>(
        &self,
        mut fetch: F,
        cancel: Option<&CancelSignal>,
        entry: Option<&LogEntry>,
    ) -> Result<(), WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, ApiError>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut polls = 0u32;

        loop {
            if cancel.is_some_and(CancelSignal::is_cancelled) {
                return Err(WaitError::Cancelled);
            }

            polls += 1;
            // a poll that is already answered wins over an elapsed deadline
            let polled = tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(WaitError::Cancelled),
                result = fetch() => result,
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(WaitError::TimedOut(self.target.clone()));
                }
            };

            match polled {
                Ok(state) if state == self.target => {
                    tracing::debug!("Reached state {} after {} polls", state, polls);
                    return Ok(());
                }
                Ok(state) if self.failure_states.contains(&state) => {
                    return Err(WaitError::Failed(state));
                }
                Ok(state) => {
                    tracing::trace!("State is {}, waiting for {}", state, self.target);
                }
                Err(e) => {
                    tracing::warn!("Polling state failed: {}", e);
                    if let Some(entry) = entry {
                        entry.set_details(&format_api_error(&e), "poll failed: ");
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(WaitError::TimedOut(self.target.clone()));
            }

            let next_poll = (Instant::now() + self.interval).min(deadline);
            tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(WaitError::Cancelled),
                _ = tokio::time::sleep_until(next_poll) => {}
            }
        }
    }
}
