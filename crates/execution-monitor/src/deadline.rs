//! Per-call deadlines.
//!
//! A client owns one [`CallDeadline`] slot. Every outbound RPC call takes a
//! fresh [`CallScope`] from it, which cancels the scope handed out before.
//! At most one scope per client is therefore live at a time.
//!
//! Scopes are children of the slot's shutdown token. Cancelling that token
//! aborts the call in flight without waiting for the client lock.

use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Default deadline window of a single RPC call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Slot holding the cancellation token of the most recently issued call.
#[derive(Debug)]
pub struct CallDeadline {
    timeout: Duration,
    shutdown: CancellationToken,
    active: Option<CancellationToken>,
}

impl CallDeadline {
    /// Create a slot whose scopes are all cancelled along with `shutdown`.
    pub fn new(timeout: Duration, shutdown: CancellationToken) -> Self {
        Self {
            timeout,
            shutdown,
            active: None,
        }
    }

    /// Deadline window applied to each call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a scope for the next call, cancelling the previous one.
    ///
    /// The deadline is measured from this moment.
    pub fn next(&mut self) -> CallScope {
        if let Some(token) = self.active.take() {
            token.cancel();
        }

        let token = self.shutdown.child_token();
        self.active = Some(token.clone());

        CallScope {
            token,
            deadline: Instant::now() + self.timeout,
            timeout: self.timeout,
        }
    }
}

impl Default for CallDeadline {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT, CancellationToken::new())
    }
}

/// Deadline and cancellation bound to exactly one RPC call.
#[derive(Debug)]
pub struct CallScope {
    token: CancellationToken,
    deadline: Instant,
    timeout: Duration,
}

impl CallScope {
    /// Drive `call` to completion unless the scope is cancelled or the
    /// deadline elapses first.
    pub async fn run<T>(
        self,
        method: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;

            _ = self.token.cancelled() => Err(Error::Cancelled { method }),

            result = tokio::time::timeout_at(self.deadline, call) => {
                result.map_err(|_| Error::DeadlineExceeded {
                    method,
                    timeout: self.timeout,
                })?
            }
        }
    }
}
