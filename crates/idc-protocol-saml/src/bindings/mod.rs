//! SAML bindings.
//!
//! Requests leave through either binding; responses come back through the
//! binding the IdP chose and arrive as an [`InboundMessage`].
//!
//! | Binding | Transport | Encoding |
//! |---|---|---|
//! | HTTP-POST | auto-submitted HTML form | base64 |
//! | HTTP-Redirect | query string | raw DEFLATE, base64, percent-encoding |

mod inbound;
mod post;
mod redirect;

pub use inbound::*;
pub use post::*;
pub use redirect::*;

use crate::error::{SamlError, SamlResult};

/// Parameter carrying an `AuthnRequest`.
pub const PARAM_SAML_REQUEST: &str = "SAMLRequest";

/// Parameter carrying a response.
pub const PARAM_SAML_RESPONSE: &str = "SAMLResponse";

/// Parameter carrying the relay state.
pub const PARAM_RELAY_STATE: &str = "RelayState";

/// Which protocol message a binding parameter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// `AuthnRequest`, sent to the IdP.
    Request,
    /// Response, sent back by the IdP.
    Response,
}

impl SamlMessageType {
    /// Returns the form or query parameter name.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => PARAM_SAML_REQUEST,
            Self::Response => PARAM_SAML_RESPONSE,
        }
    }

    /// Maps a parameter name back to the message type.
    #[must_use]
    pub fn from_param(name: &str) -> Option<Self> {
        match name {
            PARAM_SAML_REQUEST => Some(Self::Request),
            PARAM_SAML_RESPONSE => Some(Self::Response),
            _ => None,
        }
    }
}

/// A message with its binding encoding removed.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// Message XML.
    pub xml: String,
    /// Parameter the message was carried in.
    pub message_type: SamlMessageType,
    /// Relay state sent along, if any.
    pub relay_state: Option<String>,
}

fn utf8(bytes: Vec<u8>) -> SamlResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| SamlError::InvalidRequest(format!("message is not UTF-8: {e}")))
}
