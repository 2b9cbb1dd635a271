//! SAML 2.0 identity provider sessions.
//!
//! This crate turns a SAML login into the protocol-neutral
//! [`IdpSession`](idc_idp::IdpSession) capability set:
//!
//! - **Initiation** - build an `AuthnRequest` and hand it to the browser with
//!   the HTTP-Redirect or HTTP-POST binding
//! - **Completion** - delegate validation of the response to the
//!   [`ServiceProvider`] and resolve the subject from the assertion
//!
//! # Architecture
//!
//! - [`types`] - Assertion, NameID and `AuthnRequest` types
//! - [`bindings`] - POST and Redirect binding encoding and decoding
//! - [`sp`] - The protocol library contract
//! - [`resolve`] - Attribute flattening and subject identifier resolution
//! - [`provider`] - A configured IdP connection
//! - [`session`] - One login attempt
//! - [`error`] - Error types for SAML operations
//!
//! # Example
//!
//! ```rust,ignore
//! use idc_idp::{IdpSession, RequestContext};
//! use idc_protocol_saml::{InboundMessage, SamlProvider};
//!
//! let provider = SamlProvider::from_idp_config(&idp_config, service_provider);
//! let mut session = provider.new_session(request_id, Some(InboundMessage::from_post_form(&form)?));
//! let user = session.fetch_user(&RequestContext::new()).await?;
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod error;
pub mod provider;
pub mod resolve;
pub mod session;
pub mod sp;
pub mod types;

pub use bindings::InboundMessage;
pub use error::{SamlError, SamlResult};
pub use provider::{SamlProvider, SamlProviderConfig};
pub use session::SamlSession;
pub use sp::{ServiceProvider, ServiceProviderConfig};
pub use types::*;
