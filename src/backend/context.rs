//! Per-call execution context
//!
//! Carries the caller's cancellation signal and optional deadline into every
//! backend call. Cancelling the token aborts in-flight requests and stops
//! row cursors at their next pull.

use futures_util::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{BackendError, BackendResult};
use super::RowStream;

#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// Context with no deadline and a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that times out `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Builder method: set the deadline
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builder method: tie this context to an existing token
    pub fn cancelled_by(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail fast if the caller already gave up
    pub fn check(&self) -> BackendResult<()> {
        if self.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(BackendError::Timeout),
            _ => Ok(()),
        }
    }

    /// Drive `fut` to completion unless the context is cancelled or its deadline passes
    pub async fn run<T, F>(&self, fut: F) -> BackendResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(BackendError::Timeout),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BackendError::Cancelled),
            result = bounded => result,
        }
    }

    /// Wrap a row cursor so every pull honours this context
    ///
    /// The first cancellation or timeout is yielded as an error and ends the
    /// stream.
    pub fn guard(&self, rows: RowStream) -> RowStream {
        let state = (rows, self.clone(), false);
        stream::unfold(state, |(mut rows, ctx, done)| async move {
            if done {
                return None;
            }
            let pulled = ctx.run(async { Ok(rows.next().await) }).await;
            match pulled {
                Ok(Some(item)) => Some((item, (rows, ctx, false))),
                Ok(None) => None,
                Err(e) => Some((Err(e), (rows, ctx, true))),
            }
        })
        .boxed()
    }
}
