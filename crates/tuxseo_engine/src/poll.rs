use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tuxseo_logging::{tux_debug, tux_error, tux_warn};

use crate::dispatch::ActionDispatcher;
use crate::{ActionError, ActionRequest};

/// Bounds for a status poll: fixed interval while healthy, exponential backoff on errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
    pub backoff_factor: u32,
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 150,
            max_consecutive_errors: 10,
            backoff_factor: 2,
            max_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Wait this long, then tick again.
    Continue(Duration),
    Done,
    Exhausted,
}

/// Attempt bookkeeping for one poll run, independent of timers and IO.
#[derive(Debug, Clone)]
pub struct PollTracker {
    policy: PollPolicy,
    attempts: u32,
    consecutive_errors: u32,
    finished: bool,
}

impl PollTracker {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            consecutive_errors: 0,
            finished: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn record_status(&mut self, done: bool) -> PollStep {
        if self.finished {
            return PollStep::Done;
        }
        self.attempts += 1;
        self.consecutive_errors = 0;
        if done {
            self.finished = true;
            PollStep::Done
        } else if self.attempts >= self.policy.max_attempts {
            self.finished = true;
            PollStep::Exhausted
        } else {
            PollStep::Continue(self.policy.interval)
        }
    }

    pub fn record_error(&mut self) -> PollStep {
        if self.finished {
            return PollStep::Done;
        }
        self.attempts += 1;
        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.policy.max_consecutive_errors
            || self.attempts >= self.policy.max_attempts
        {
            self.finished = true;
            return PollStep::Exhausted;
        }
        PollStep::Continue(self.backoff())
    }

    fn backoff(&self) -> Duration {
        let factor = self
            .policy
            .backoff_factor
            .max(1)
            .saturating_pow(self.consecutive_errors);
        self.policy
            .interval
            .saturating_mul(factor)
            .min(self.policy.max_interval)
    }
}

/// Callbacks for one poll run. `on_done` and `on_exhausted` are each called at most once,
/// and never after the run was stopped.
pub trait PollObserver: Send + Sync {
    fn is_done(&self, status: &Value) -> bool;
    fn on_done(&self, status: Value);
    /// A tick failed; the loop keeps going.
    fn on_error(&self, attempt: u32, error: &ActionError);
    fn on_exhausted(&self, error: ActionError);
}

/// Cancels the poll run. Dropping the handle stops the run too.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Idempotent; safe to call at any time, including after the run finished.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled() || self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Starts polling `request` until the observer reports completion or the policy gives up.
///
/// Must be called from within a tokio runtime.
pub fn start_polling(
    dispatcher: Arc<dyn ActionDispatcher>,
    request: ActionRequest,
    policy: PollPolicy,
    observer: Arc<dyn PollObserver>,
) -> PollHandle {
    let token = CancellationToken::new();
    let run_token = token.clone();
    let task = tokio::spawn(async move {
        run(dispatcher, request, policy, observer, run_token).await;
    });
    PollHandle { token, task }
}

async fn run(
    dispatcher: Arc<dyn ActionDispatcher>,
    request: ActionRequest,
    policy: PollPolicy,
    observer: Arc<dyn PollObserver>,
    token: CancellationToken,
) {
    let mut tracker = PollTracker::new(policy);
    let mut delay = policy.interval;
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = dispatcher.perform(request.clone()) => result,
        };
        // A stop may land while the response was being read.
        if token.is_cancelled() {
            return;
        }

        let step = match result {
            Ok(status) => {
                let done = observer.is_done(&status);
                let step = tracker.record_status(done);
                if step == PollStep::Done {
                    token.cancel();
                    tux_debug!("poll {} done after {} attempts", request.endpoint, tracker.attempts());
                    observer.on_done(status);
                    return;
                }
                step
            }
            Err(error) => {
                tux_warn!(
                    "poll {} attempt {} failed: {error}",
                    request.endpoint,
                    tracker.attempts() + 1
                );
                let step = tracker.record_error();
                observer.on_error(tracker.attempts(), &error);
                step
            }
        };

        match step {
            PollStep::Continue(next) => delay = next,
            PollStep::Done => return,
            PollStep::Exhausted => {
                token.cancel();
                tux_error!(
                    "poll {} exhausted after {} attempts",
                    request.endpoint,
                    tracker.attempts()
                );
                observer.on_exhausted(ActionError::Exhausted {
                    attempts: tracker.attempts(),
                });
                return;
            }
        }
    }
}
