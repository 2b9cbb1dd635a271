//! Inbound protocol messages arriving at the assertion consumer service.

use std::collections::HashMap;

use crate::error::{SamlError, SamlResult};
use crate::types::SamlBinding;

use super::{
    DecodedMessage, HttpPostBinding, HttpRedirectBinding, SamlMessageType, PARAM_RELAY_STATE,
    PARAM_SAML_RESPONSE,
};

/// The raw, still encoded response the IdP sent back through the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Binding the message arrived through.
    pub binding: SamlBinding,
    /// Encoded `SAMLResponse` parameter.
    pub saml_response: String,
    /// `RelayState` parameter, if any.
    pub relay_state: Option<String>,
}

impl InboundMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(binding: SamlBinding, saml_response: impl Into<String>) -> Self {
        Self {
            binding,
            saml_response: saml_response.into(),
            relay_state: None,
        }
    }

    /// Sets the relay state.
    #[must_use]
    pub fn with_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }

    /// Builds a message from decoded HTTP-POST form fields.
    pub fn from_post_form(form: &HashMap<String, String>) -> SamlResult<Self> {
        let saml_response = form
            .get(PARAM_SAML_RESPONSE)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SamlError::MissingElement(PARAM_SAML_RESPONSE.to_string()))?;

        Ok(Self {
            binding: SamlBinding::HttpPost,
            saml_response: saml_response.clone(),
            relay_state: form.get(PARAM_RELAY_STATE).cloned(),
        })
    }

    /// Builds a message from a raw HTTP-Redirect query string.
    pub fn from_redirect_query(query: &str) -> SamlResult<Self> {
        let mut saml_response = None;
        let mut relay_state = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PARAM_SAML_RESPONSE => saml_response = Some(value.into_owned()),
                PARAM_RELAY_STATE => relay_state = Some(value.into_owned()),
                _ => {}
            }
        }

        let saml_response = saml_response
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SamlError::MissingElement(PARAM_SAML_RESPONSE.to_string()))?;

        Ok(Self {
            binding: SamlBinding::HttpRedirect,
            saml_response,
            relay_state,
        })
    }

    /// Decodes the response XML according to the binding.
    pub fn decode(&self) -> SamlResult<DecodedMessage> {
        let relay_state = self.relay_state.as_deref();
        match self.binding {
            SamlBinding::HttpPost => {
                HttpPostBinding::decode(&self.saml_response, SamlMessageType::Response, relay_state)
            }
            SamlBinding::HttpRedirect => HttpRedirectBinding::decode(
                &self.saml_response,
                SamlMessageType::Response,
                relay_state,
            ),
        }
    }
}
