//! Cancellation and deadline propagation
//!
//! Every backend and provider call receives a [`Context`]. The engine
//! never adds a timeout of its own; it only passes the caller's context
//! down to the I/O in progress.

use crate::error::{VaultError, VaultResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Use an existing cancellation token
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Derive a context whose deadline is `timeout` from now.
    ///
    /// An earlier deadline already on `self` is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context with the given deadline
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context; cancelling the child leaves the parent running
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context is already done
    pub fn check(&self, op: &str) -> VaultResult<()> {
        if self.cancel.is_cancelled() {
            return Err(VaultError::Cancelled { op: op.to_string() });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(VaultError::DeadlineExceeded { op: op.to_string() });
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first. The losing future is dropped.
    pub async fn run<T, F>(&self, op: &str, fut: F) -> VaultResult<T>
    where
        F: Future<Output = VaultResult<T>>,
    {
        self.check(op)?;

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            res = fut => res,
            _ = self.cancel.cancelled() => Err(VaultError::Cancelled { op: op.to_string() }),
            _ = deadline => Err(VaultError::DeadlineExceeded { op: op.to_string() }),
        }
    }
}
