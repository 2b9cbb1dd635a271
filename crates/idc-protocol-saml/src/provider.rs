//! SAML identity provider connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use idc_core::config::SamlIdpConfig;

use crate::bindings::InboundMessage;
use crate::session::SamlSession;
use crate::sp::ServiceProvider;

/// Per-connection settings that shape identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamlProviderConfig {
    /// Connection name, used in logs and audit events.
    pub name: String,
    /// Attribute holding the subject when the NameID is transient or absent.
    pub transient_mapping_attribute_name: Option<String>,
    /// RelayState sent along with the `AuthnRequest`.
    pub relay_state: Option<String>,
    /// Upper bound for validating one response.
    pub response_timeout: Option<Duration>,
}

impl SamlProviderConfig {
    /// Creates a configuration with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the transient mapping attribute.
    #[must_use]
    pub fn with_transient_mapping(mut self, attribute_name: impl Into<String>) -> Self {
        self.transient_mapping_attribute_name = Some(attribute_name.into());
        self
    }

    /// Sets the relay state.
    #[must_use]
    pub fn with_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }
}

impl From<&SamlIdpConfig> for SamlProviderConfig {
    fn from(config: &SamlIdpConfig) -> Self {
        Self {
            name: config.name.clone(),
            transient_mapping_attribute_name: config.transient_mapping_attribute_name.clone(),
            relay_state: None,
            response_timeout: config.response_timeout,
        }
    }
}

/// A configured SAML identity provider; hands out one session per login.
#[derive(Clone)]
pub struct SamlProvider {
    config: SamlProviderConfig,
    service_provider: Arc<dyn ServiceProvider>,
}

impl SamlProvider {
    /// Creates a provider.
    #[must_use]
    pub fn new(config: SamlProviderConfig, service_provider: Arc<dyn ServiceProvider>) -> Self {
        Self {
            config,
            service_provider,
        }
    }

    /// Creates a provider from an IdP connection.
    #[must_use]
    pub fn from_idp_config(
        config: &SamlIdpConfig,
        service_provider: Arc<dyn ServiceProvider>,
    ) -> Self {
        Self::new(config.into(), service_provider)
    }

    /// Returns the connection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the configured transient mapping attribute.
    #[must_use]
    pub fn transient_mapping_attribute_name(&self) -> Option<&str> {
        self.config.transient_mapping_attribute_name.as_deref()
    }

    /// Returns the provider configuration.
    #[must_use]
    pub const fn config(&self) -> &SamlProviderConfig {
        &self.config
    }

    /// Starts a session for one login attempt.
    ///
    /// `request_id` is generated by the caller before initiation and must be
    /// the same when the callback is handled. `message` is the callback's
    /// inbound message, when already known.
    #[must_use]
    pub fn new_session(
        &self,
        request_id: impl Into<String>,
        message: Option<InboundMessage>,
    ) -> SamlSession {
        SamlSession::new(
            self.config.clone(),
            Arc::clone(&self.service_provider),
            request_id.into(),
            message,
        )
    }
}

impl fmt::Debug for SamlProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
