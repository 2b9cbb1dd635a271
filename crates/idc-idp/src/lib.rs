//! # idc-idp
//!
//! Identity provider session framework.
//!
//! Every federation protocol (SAML today) implements the same capability set,
//! [`IdpSession`]: hand the browser something to follow, then turn the
//! provider's callback into a [`ResolvedIdentity`](idc_model::ResolvedIdentity)
//! or a typed failure. Callers program against the trait, never against a
//! concrete protocol.
//!
//! - [`action`] - What the HTTP layer must do to start authentication
//! - [`context`] - Cancellation and deadline of the surrounding request
//! - [`error`] - Closed error kinds with stable diagnostic codes
//! - [`session`] - The capability set and session lifecycle

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod context;
pub mod error;
pub mod session;

pub use action::{AuthAction, ResponseCapture};
pub use context::{Interrupted, RequestContext};
pub use error::{ErrorKind, FetchUserError, IdpError, IdpResult};
pub use session::{IdpSession, SessionState};
