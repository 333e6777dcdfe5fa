//! Cancellation and deadline context shared by every blocking stage of a run.
//!
//! A [`RunContext`] is created once at process start and borrowed by the
//! store query and by each delivery attempt. Cancellation is signalled by
//! disconnecting a zero-capacity crossbeam channel, which lets waits select on
//! the cancellation signal and a timer at the same time.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvError, Sender, TryRecvError, after, bounded, select};
use thiserror::Error;

/// Reason a run stopped before its work completed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Interrupted {
    /// The owning [`CancelHandle`] cancelled the run.
    #[error("run was cancelled")]
    Cancelled,
    /// The run deadline elapsed.
    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

/// Handle that cancels the associated [`RunContext`].
///
/// Dropping the handle cancels the run as well.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Option<Sender<()>>,
}

impl CancelHandle {
    /// Cancel the run. Subsequent checks on the context fail with
    /// [`Interrupted::Cancelled`].
    pub fn cancel(&mut self) {
        self.tx.take();
    }
}

/// Deadline and cancellation state for a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    deadline: Option<Instant>,
    cancelled: Receiver<()>,
}

impl RunContext {
    /// Create a context with an optional absolute deadline.
    pub fn new(deadline: Option<Instant>) -> (Self, CancelHandle) {
        let (tx, rx) = bounded(0);
        (
            Self {
                deadline,
                cancelled: rx,
            },
            CancelHandle { tx: Some(tx) },
        )
    }

    /// Create a context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> (Self, CancelHandle) {
        Self::new(Instant::now().checked_add(timeout))
    }

    /// Create a context without a deadline.
    pub fn unbounded() -> (Self, CancelHandle) {
        Self::new(None)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cancelled.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Time left before the deadline, or `None` when the run is unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fail if the run was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Clamp a per-operation timeout so it never outlives the run deadline.
    pub fn bound(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => timeout.min(left),
            None => timeout,
        }
    }

    /// Block for `delay`, waking early if the run is cancelled.
    ///
    /// Returns an error when the wait was cut short by cancellation or when
    /// the deadline elapsed during the wait.
    pub fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        self.check()?;
        let timer = after(self.bound(delay));
        select! {
            recv(self.cancelled) -> _ => Err(Interrupted::Cancelled),
            recv(timer) -> _ => self.check(),
        }
    }

    /// Wait for a message on `rx`, abandoning the wait if the run is
    /// cancelled first.
    ///
    /// The inner result is `Err` when every sender hung up without sending.
    pub fn recv<T>(&self, rx: &Receiver<T>) -> Result<Result<T, RecvError>, Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        select! {
            recv(rx) -> msg => Ok(msg),
            recv(self.cancelled) -> _ => Err(Interrupted::Cancelled),
        }
    }
}
