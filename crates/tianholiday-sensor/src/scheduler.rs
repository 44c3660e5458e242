//! Fetch scheduler with bounded linear retry.
//!
//! One worker task owns the whole state machine:
//!
//! ```text
//!            trigger / refresh
//!   Idle ───────────────────────▶ Fetching ──(ok)──▶ Published
//!    ▲                              │  ▲
//!    │ retries exhausted            │  │ retry_delay elapsed
//!    └──────────────────────────────┤  │
//!                                   ▼  │
//!                              RetryWaiting
//! ```
//!
//! - the first cycle starts immediately, later ones follow the [`Cadence`]
//! - a cycle makes at most `1 + max_retries` attempts
//! - a scheduled trigger cancels a pending retry and starts a new cycle
//! - manual refreshes never move the next scheduled trigger
//! - at most one fetch is in flight; refreshes join it or the pending retry

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use tianholiday_providers::{FetchError, FetchResult};
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::cadence::Cadence;
use crate::error::SensorError;

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// When the scheduled trigger fires.
    pub cadence: Cadence,
    /// Retries allowed after the first failed attempt of a cycle.
    pub max_retries: u32,
    /// Delay between a failed attempt and its retry.
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cadence: Cadence::default(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(Self::DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl SchedulerConfig {
    /// Default number of retries per cycle.
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    /// Default retry delay in seconds.
    pub const DEFAULT_RETRY_DELAY_SECS: u64 = 300;

    /// Creates a config with the given cadence and default retry policy.
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            ..Default::default()
        }
    }

    /// Builder: set the retry budget per cycle.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builder: set the retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Maximum number of attempts in one cycle.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No cycle running (before the first attempt, or after giving up).
    Idle,
    /// An attempt is in flight.
    Fetching,
    /// An attempt failed and a retry is pending.
    RetryWaiting,
    /// The last attempt succeeded.
    Published,
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::RetryWaiting => "retry_waiting",
            Self::Published => "published",
        };
        f.write_str(name)
    }
}

/// What caused an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// First cycle after start.
    Startup,
    /// Cadence timer.
    Scheduled,
    /// Refresh requested through a handle.
    Manual,
    /// Retry of a failed attempt.
    Retry,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Startup => "startup",
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
            Self::Retry => "retry",
        };
        f.write_str(name)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the delay.
    RetryAfter(Duration),
    /// Budget exhausted; wait for the next trigger.
    GiveUp,
}

/// Result delivered to refresh callers.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The attempt succeeded and a new snapshot was published.
    Published,
    /// The attempt failed. The previously published snapshot is unchanged.
    Failed {
        error: Arc<FetchError>,
        retry_scheduled: bool,
    },
    /// The scheduler stopped before the attempt finished.
    Stopped,
}

impl RefreshOutcome {
    /// Returns true if a snapshot was published.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Commands that can be sent to the scheduler.
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Fetch now, optionally reporting the outcome.
    Refresh {
        reply: Option<oneshot::Sender<RefreshOutcome>>,
    },
    /// Stop the scheduler, cancelling timers and any in-flight fetch.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    /// Current phase.
    pub phase: SchedulerPhase,
    /// Retries used in the current cycle.
    pub retry_count: u32,
    /// Cycles started.
    pub cycles: u64,
    /// Attempts made.
    pub attempts: u64,
    /// Last successful attempt.
    pub last_success: Option<DateTime<Utc>>,
    /// Last attempt, successful or not.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Error of the last failed attempt, cleared on success.
    pub last_error: Option<String>,
    /// Next scheduled trigger.
    pub next_trigger_at: Option<DateTime<Utc>>,
    /// Pending retry, if any.
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new() -> Self {
        Self {
            phase: SchedulerPhase::Idle,
            retry_count: 0,
            cycles: 0,
            attempts: 0,
            last_success: None,
            last_attempt: None,
            last_error: None,
            next_trigger_at: None,
            next_retry_at: None,
        }
    }

    /// Starts a new cycle, resetting the retry budget.
    pub fn begin_cycle(&mut self) {
        self.cycles += 1;
        self.retry_count = 0;
        self.next_retry_at = None;
    }

    /// Marks an attempt as in flight.
    pub fn begin_attempt(&mut self) {
        self.phase = SchedulerPhase::Fetching;
        self.attempts += 1;
        self.last_attempt = Some(Utc::now());
        self.next_retry_at = None;
    }

    /// Records a successful attempt.
    pub fn record_success(&mut self) {
        self.phase = SchedulerPhase::Published;
        self.retry_count = 0;
        self.last_success = Some(Utc::now());
        self.last_error = None;
        self.next_retry_at = None;
    }

    /// Records a failed attempt and decides whether to retry.
    pub fn record_failure(
        &mut self,
        error: &FetchError,
        max_retries: u32,
        retry_delay: Duration,
    ) -> RetryDecision {
        self.last_error = Some(error.to_string());
        if self.retry_count < max_retries {
            self.retry_count += 1;
            self.phase = SchedulerPhase::RetryWaiting;
            self.next_retry_at = wall_clock_after(retry_delay);
            RetryDecision::RetryAfter(retry_delay)
        } else {
            self.phase = SchedulerPhase::Idle;
            self.next_retry_at = None;
            RetryDecision::GiveUp
        }
    }
}

/// Deadline used when a delay does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `Instant::now() + delay`, clamped to a far-future deadline on overflow.
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Wall-clock time `delay` from now, or `None` if it is out of range.
fn wall_clock_after(delay: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delay| Utc::now().checked_add_signed(delay))
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// Drives fetch cycles according to a [`SchedulerConfig`].
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Runs the scheduler until stopped or until every handle is dropped.
    ///
    /// `sync_fn` performs one attempt: fetch, normalize and publish.
    pub async fn run<F, Fut>(self, sync_fn: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult<()>> + Send,
    {
        let Scheduler {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only handles keep the channel open from here on.
        drop(command_tx);

        info!(
            cadence = %config.cadence,
            max_retries = config.max_retries,
            retry_delay_secs = config.retry_delay.as_secs(),
            "scheduler started"
        );

        let mut worker = Worker {
            config,
            state,
            waiters: Vec::new(),
        };
        worker.drive(&sync_fn, &mut command_rx).await;
        worker.shutdown().await;

        info!("scheduler stopped");
    }
}

enum AttemptEnd {
    /// The attempt completed; `Some` carries the retry delay.
    Finished(Option<Duration>),
    Stopped,
}

struct Worker {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

impl Worker {
    async fn drive<F, Fut>(&mut self, sync_fn: &F, command_rx: &mut mpsc::Receiver<SchedulerCommand>)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FetchResult<()>>,
    {
        let mut trigger = Trigger::Startup;
        let mut next_trigger = Instant::now();
        let mut retry_at: Option<Instant> = None;

        loop {
            let retry_deadline = retry_at.unwrap_or(next_trigger);

            let end = tokio::select! {
                _ = time::sleep_until(next_trigger) => {
                    if retry_at.take().is_some() {
                        info!("scheduled trigger cancels pending retry");
                    }
                    next_trigger = self.schedule_next_trigger().await;
                    let current = trigger;
                    trigger = Trigger::Scheduled;
                    self.start_cycle(sync_fn, command_rx, current).await
                }
                _ = time::sleep_until(retry_deadline), if retry_at.is_some() => {
                    retry_at = None;
                    self.attempt(sync_fn, command_rx, Trigger::Retry).await
                }
                command = command_rx.recv() => match command {
                    Some(SchedulerCommand::Refresh { reply }) => {
                        self.waiters.extend(reply);
                        if retry_at.is_some() {
                            debug!("refresh coalesced into pending retry");
                            continue;
                        }
                        self.start_cycle(sync_fn, command_rx, Trigger::Manual).await
                    }
                    Some(SchedulerCommand::Stop) | None => AttemptEnd::Stopped,
                },
            };

            match end {
                AttemptEnd::Finished(retry) => {
                    retry_at = retry.map(deadline_after);
                }
                AttemptEnd::Stopped => return,
            }
        }
    }

    async fn schedule_next_trigger(&self) -> Instant {
        let delay = self.config.cadence.delay_from(&Local::now());
        self.state.write().await.next_trigger_at = wall_clock_after(delay);
        debug!(delay_secs = delay.as_secs(), "next scheduled trigger");
        deadline_after(delay)
    }

    async fn start_cycle<F, Fut>(
        &mut self,
        sync_fn: &F,
        command_rx: &mut mpsc::Receiver<SchedulerCommand>,
        trigger: Trigger,
    ) -> AttemptEnd
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FetchResult<()>>,
    {
        {
            let mut state = self.state.write().await;
            state.begin_cycle();
            debug!(cycle = state.cycles, %trigger, "starting fetch cycle");
        }
        self.attempt(sync_fn, command_rx, trigger).await
    }

    async fn attempt<F, Fut>(
        &mut self,
        sync_fn: &F,
        command_rx: &mut mpsc::Receiver<SchedulerCommand>,
        trigger: Trigger,
    ) -> AttemptEnd
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FetchResult<()>>,
    {
        let attempt = {
            let mut state = self.state.write().await;
            state.begin_attempt();
            state.retry_count + 1
        };
        info!(%trigger, attempt, "fetching holiday data");

        let fetch = sync_fn();
        tokio::pin!(fetch);

        let result = loop {
            tokio::select! {
                biased;
                command = command_rx.recv() => match command {
                    Some(SchedulerCommand::Refresh { reply }) => {
                        debug!(attempt, "refresh joined in-flight fetch");
                        self.waiters.extend(reply);
                    }
                    Some(SchedulerCommand::Stop) | None => {
                        debug!(attempt, "in-flight fetch cancelled");
                        return AttemptEnd::Stopped;
                    }
                },
                result = &mut fetch => break result,
            }
        };

        match result {
            Ok(()) => {
                self.state.write().await.record_success();
                info!(%trigger, attempt, "holiday data published");
                self.notify_waiters(RefreshOutcome::Published);
                AttemptEnd::Finished(None)
            }
            Err(err) => {
                let decision = self.state.write().await.record_failure(
                    &err,
                    self.config.max_retries,
                    self.config.retry_delay,
                );
                let retry = match decision {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            %trigger,
                            attempt,
                            error = %err,
                            soft = err.is_soft(),
                            retry_in_secs = delay.as_secs(),
                            "fetch failed, retry scheduled"
                        );
                        Some(delay)
                    }
                    RetryDecision::GiveUp => {
                        error!(
                            %trigger,
                            attempt,
                            error = %err,
                            "fetch failed, retries exhausted until next trigger"
                        );
                        None
                    }
                };
                self.notify_waiters(RefreshOutcome::Failed {
                    error: Arc::new(err),
                    retry_scheduled: retry.is_some(),
                });
                AttemptEnd::Finished(retry)
            }
        }
    }

    fn notify_waiters(&mut self, outcome: RefreshOutcome) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
    }

    async fn shutdown(&mut self) {
        self.notify_waiters(RefreshOutcome::Stopped);
        let mut state = self.state.write().await;
        if matches!(
            state.phase,
            SchedulerPhase::Fetching | SchedulerPhase::RetryWaiting
        ) {
            state.phase = SchedulerPhase::Idle;
        }
        state.next_retry_at = None;
        state.next_trigger_at = None;
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Requests a fetch and waits for its outcome.
    ///
    /// Joins the in-flight attempt or the pending retry when there is one.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SensorError> {
        let (reply, outcome) = oneshot::channel();
        self.command_tx
            .send(SchedulerCommand::Refresh { reply: Some(reply) })
            .await
            .map_err(|_| SensorError::SchedulerStopped)?;
        outcome.await.map_err(|_| SensorError::SchedulerStopped)
    }

    /// Requests a fetch without waiting for it.
    pub async fn request_refresh(&self) -> Result<(), SensorError> {
        self.command_tx
            .send(SchedulerCommand::Refresh { reply: None })
            .await
            .map_err(|_| SensorError::SchedulerStopped)
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), SensorError> {
        self.command_tx
            .send(SchedulerCommand::Stop)
            .await
            .map_err(|_| SensorError::SchedulerStopped)
    }

    /// Returns a copy of the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    /// Returns true while the scheduler accepts commands.
    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Completes once the scheduler has stopped accepting commands, whether
    /// it was stopped or its task died.
    pub async fn closed(&self) {
        self.command_tx.closed().await;
    }
}
