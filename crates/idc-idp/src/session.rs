//! Identity provider session capability set.

use std::fmt;

use async_trait::async_trait;
use idc_model::ResolvedIdentity;
use serde::{Deserialize, Serialize};

use crate::action::AuthAction;
use crate::context::RequestContext;
use crate::error::{FetchUserError, IdpResult};

/// Lifecycle of a single authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Constructed, nothing sent to the browser yet.
    #[default]
    Initiated,
    /// Authentication request handed out, waiting for the callback.
    AwaitingResponse,
    /// An identity was resolved.
    Resolved,
    /// The attempt failed.
    Failed,
}

impl SessionState {
    /// Returns whether the session has been consumed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::AwaitingResponse => "awaiting_response",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authentication round-trip against one identity provider.
///
/// Implemented once per federation protocol. A session serves exactly one
/// attempt: once [`fetch_user`](Self::fetch_user) has returned, the session
/// is consumed and a retry needs a new session with a new request ID.
#[async_trait]
pub trait IdpSession: Send {
    /// Produces what the browser must be sent to start authentication.
    async fn initiate_auth(&mut self, ctx: &RequestContext) -> IdpResult<AuthAction>;

    /// Resolves the user from the provider's callback.
    ///
    /// ## Errors
    ///
    /// When only the subject identifier could not be resolved, the returned
    /// [`FetchUserError`] carries the identity with its attributes.
    async fn fetch_user(
        &mut self,
        ctx: &RequestContext,
    ) -> Result<ResolvedIdentity, FetchUserError>;

    /// Returns the current lifecycle state.
    fn state(&self) -> SessionState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SessionState::Initiated.is_terminal());
        assert!(!SessionState::AwaitingResponse.is_terminal());
        assert!(SessionState::Resolved.is_terminal());
        assert!(SessionState::Failed.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(SessionState::AwaitingResponse.to_string(), "awaiting_response");
        assert_eq!(SessionState::default(), SessionState::Initiated);
    }
}
