//! Batch Executor
//!
//! Runs one command over N positional tokens:
//! resolve all tokens, confirm large batches, then build and dispatch one
//! request per resolved UUID as its own task, optionally waiting for the
//! resource to settle. Results come back in input order, one slot per token.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::api::format_api_error;
use crate::error::{ApiError, BatchError, ItemError};
use crate::livelog::{LiveLog, LogEntry};
use crate::resolver::{ResolverRegistry, ResourceKind};
use crate::waiter::{CancelHandle, CancelSignal, StateWaiter, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};

pub const DEFAULT_MAX_ACTIONS_BEFORE_CONFIRM: usize = 10;

/// Fetches the current state of one resource by UUID
pub type StatusFetch =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<String, ApiError>> + Send + Sync>;

/// Destructive commands run one item at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Risk {
    #[default]
    Low,
    High,
}

/// State an action's resource is expected to reach
#[derive(Clone)]
pub struct WaitCondition {
    pub target: &'static str,
    pub failure_states: &'static [&'static str],
    pub fetch: StatusFetch,
}

/// One remote action applied to every resolved resource
#[async_trait]
pub trait BatchCommand: Send + Sync + 'static {
    type Request: Send + 'static;
    type Output: Serialize + Send + 'static;

    /// Kind the positional tokens are resolved as
    fn kind(&self) -> ResourceKind;

    /// Log line for the action on `uuid`
    fn describe(&self, uuid: &str) -> String;

    /// Build the request for one resolved UUID. Must not do I/O.
    fn build_request(&self, uuid: &str) -> Self::Request;

    async fn execute(&self, request: Self::Request) -> Result<Self::Output, ApiError>;

    fn risk(&self) -> Risk {
        Risk::Low
    }

    fn wait_condition(&self) -> Option<WaitCondition> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Per-item cancellation of waits, addressed by input position.
///
/// A slot can be cancelled before or while the batch runs. Cancelling one
/// slot leaves its siblings alone.
#[derive(Clone, Default)]
pub struct ItemCancels {
    handles: Arc<Mutex<HashMap<usize, CancelHandle>>>,
}

impl ItemCancels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the wait of the item at `index`
    pub fn cancel(&self, index: usize) {
        self.with_handle(index, CancelHandle::cancel);
    }

    pub fn signal(&self, index: usize) -> CancelSignal {
        self.with_handle(index, CancelHandle::signal)
    }

    fn with_handle<T>(&self, index: usize, f: impl FnOnce(&CancelHandle) -> T) -> T {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        f(handles.entry(index).or_default())
    }
}

#[derive(Clone)]
pub struct ExecutionOptions {
    /// Require exactly one positional token
    pub exactly_one: bool,
    pub max_actions_before_confirm: usize,
    /// Ask before running more than `max_actions_before_confirm` actions
    pub confirm: bool,
    /// Concurrent items; `None` is unbounded
    pub workers: Option<usize>,
    /// Wait for the resulting state, if the command defines one
    pub wait: Option<WaitOptions>,
    /// Batch-wide interrupt: aborts a pending confirmation and every wait
    pub cancel: Option<CancelSignal>,
    pub item_cancels: Option<ItemCancels>,
}

impl ExecutionOptions {
    /// Cancellation seen by the wait of the item at `index`
    fn item_cancel(&self, index: usize) -> Option<CancelSignal> {
        let item = self.item_cancels.as_ref().map(|cancels| cancels.signal(index));
        match (&self.cancel, item) {
            (Some(batch), Some(item)) => Some(batch.or(&item)),
            (batch, item) => item.or_else(|| batch.clone()),
        }
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            exactly_one: false,
            max_actions_before_confirm: DEFAULT_MAX_ACTIONS_BEFORE_CONFIRM,
            confirm: true,
            workers: None,
            wait: None,
            cancel: None,
            item_cancels: None,
        }
    }
}

/// Operator confirmation
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> io::Result<bool>;
}

/// Prompts on stderr and reads a y/N answer from stdin
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{prompt} [y/N]: ")?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Result of one token
#[derive(Debug)]
pub struct ItemOutcome<T> {
    pub token: String,
    pub uuid: String,
    pub result: Result<T, ItemError>,
}

/// All results of a batch, in input order
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub items: Vec<ItemOutcome<T>>,
}

impl<T> BatchOutcome<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_err()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &ItemError> {
        self.items.iter().filter_map(|i| i.result.as_ref().err())
    }
}

pub struct BatchExecutor<'a> {
    registry: &'a ResolverRegistry,
    log: LiveLog,
    confirm: Arc<dyn Confirm>,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(registry: &'a ResolverRegistry, log: LiveLog, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            registry,
            log,
            confirm,
        }
    }

    /// Resolve `tokens` and run `command` on each of them
    pub async fn send<C: BatchCommand>(
        &self,
        tokens: &[String],
        command: Arc<C>,
        opts: &ExecutionOptions,
    ) -> Result<BatchOutcome<C::Output>, BatchError> {
        if opts.exactly_one && tokens.len() != 1 {
            return Err(BatchError::Validation(
                "single identifier required".to_string(),
            ));
        }
        if tokens.is_empty() {
            return Err(BatchError::Validation(
                "at least one identifier required".to_string(),
            ));
        }

        let kind = command.kind();
        let uuids = self.registry.resolve(kind, tokens).await?;

        if opts.confirm && uuids.len() > opts.max_actions_before_confirm {
            let prompt = format!("About to run {} actions on {}s. Continue?", uuids.len(), kind);
            if !self.ask(prompt, opts.cancel.as_ref()).await? {
                return Err(BatchError::Cancelled);
            }
        }

        let permits = match command.risk() {
            Risk::High => 1,
            Risk::Low => opts
                .workers
                .unwrap_or(Semaphore::MAX_PERMITS)
                .clamp(1, Semaphore::MAX_PERMITS),
        };
        let semaphore = Arc::new(Semaphore::new(permits));
        tracing::info!(
            "Dispatching {} {} actions with {} permits",
            uuids.len(),
            kind,
            permits
        );

        let mut handles = Vec::with_capacity(uuids.len());
        for (index, (token, uuid)) in tokens.iter().zip(&uuids).enumerate() {
            let request = command.build_request(uuid);
            let entry = self.log.new_entry(command.describe(uuid));
            let wait = opts.wait.clone().and_then(|options| {
                command
                    .wait_condition()
                    .map(|cond| (cond, options, opts.item_cancel(index)))
            });
            let item = Item {
                token: token.clone(),
                uuid: uuid.clone(),
                entry,
                wait,
            };
            let command = Arc::clone(&command);
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        item.entry.mark_failed(&e);
                        return Err(ItemError::Aborted {
                            token: item.token,
                            reason: e.to_string(),
                        });
                    }
                };
                run_item(command, request, item).await
            }));
        }

        let joined = join_all(handles).await;
        let items = tokens
            .iter()
            .zip(uuids)
            .zip(joined)
            .map(|((token, uuid), joined)| {
                let result = joined.unwrap_or_else(|e| {
                    Err(ItemError::Aborted {
                        token: token.clone(),
                        reason: e.to_string(),
                    })
                });
                ItemOutcome {
                    token: token.clone(),
                    uuid,
                    result,
                }
            })
            .collect();

        Ok(BatchOutcome { items })
    }

    /// Ask the operator; an interrupt while the prompt is open counts as "no"
    async fn ask(&self, prompt: String, cancel: Option<&CancelSignal>) -> Result<bool, BatchError> {
        let confirm = Arc::clone(&self.confirm);
        let prompt = tokio::task::spawn_blocking(move || confirm.confirm(&prompt));
        let joined = match cancel {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    tracing::info!("Confirmation interrupted");
                    return Ok(false);
                }
                joined = prompt => joined,
            },
            None => prompt.await,
        };
        Ok(joined.map_err(io::Error::other)??)
    }
}

struct Item {
    token: String,
    uuid: String,
    entry: LogEntry,
    wait: Option<(WaitCondition, WaitOptions, Option<CancelSignal>)>,
}

async fn run_item<C: BatchCommand>(
    command: Arc<C>,
    request: C::Request,
    item: Item,
) -> Result<C::Output, ItemError> {
    let Item {
        token,
        uuid,
        entry,
        wait,
    } = item;
    let message = command.describe(&uuid);

    entry.started_now();
    entry.set_message(format!("{message}: sending request"));
    tracing::info!("{}: sending request", message);

    let output = match command.execute(request).await {
        Ok(output) => output,
        Err(source) => {
            tracing::error!("{}: {}", message, source);
            entry.set_message(format!("{message}: failed"));
            entry.mark_failed(&format_api_error(&source));
            return Err(ItemError::Remote { token, source });
        }
    };

    if let Some((condition, options, cancel)) = wait {
        entry.set_message(format!("{message}: waiting for {}", condition.target));
        let waiter = StateWaiter::new(condition.target)
            .failure_states(condition.failure_states.iter().copied())
            .interval(options.interval)
            .timeout(options.timeout);
        let fetch = condition.fetch;
        let waited = waiter
            .wait(
                || fetch(uuid.clone()),
                cancel.as_ref(),
                Some(&entry),
            )
            .await;
        if let Err(source) = waited {
            tracing::warn!("{}: {}", message, source);
            entry.set_message(format!("{message}: request sent, wait failed"));
            entry.mark_failed(&source);
            return Err(ItemError::Wait { token, source });
        }
        entry.set_message(format!("{message}: done"));
    } else {
        entry.set_message(format!("{message}: request sent"));
    }

    entry.mark_done();
    Ok(output)
}
