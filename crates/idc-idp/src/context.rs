//! Request context: cancellation and deadline of the surrounding request.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::IdpError;

/// Diagnostic code for a canceled request.
pub const CODE_CANCELED: &str = "IDP-canceled";

/// Diagnostic code for an exceeded deadline.
pub const CODE_DEADLINE_EXCEEDED: &str = "IDP-deadline-exceeded";

/// Why a delegated call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The request was canceled.
    Canceled,
    /// The request deadline passed.
    DeadlineExceeded,
}

impl From<Interrupted> for IdpError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Canceled => Self::canceled(CODE_CANCELED, "request canceled"),
            Interrupted::DeadlineExceeded => {
                Self::canceled(CODE_DEADLINE_EXCEEDED, "request deadline exceeded")
            }
        }
    }
}

/// Cancellation and deadline of one inbound request.
///
/// Cloning shares the cancellation token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context without deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context observing an existing cancellation token.
    #[must_use]
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a copy whose deadline is at most `timeout` from now.
    ///
    /// An earlier deadline already on the context is kept.
    #[must_use]
    pub fn bounded(&self, timeout: Duration) -> Self {
        let capped = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= capped => existing,
            _ => capped,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels the request.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns why the request can no longer make progress, if it cannot.
    #[must_use]
    pub fn interrupted(&self) -> Option<Interrupted> {
        if self.cancel.is_cancelled() {
            return Some(Interrupted::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupted::DeadlineExceeded),
            _ => None,
        }
    }

    /// Runs a future until it completes, the request is canceled, or the
    /// deadline passes.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        if let Some(reason) = self.interrupted() {
            return Err(reason);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupted::Canceled),
            () = deadline => Err(Interrupted::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}
