//! Service provider collaborator.
//!
//! The [`ServiceProvider`] is the protocol library this crate delegates to:
//! it verifies signatures, checks conditions and `InResponseTo`, and turns an
//! inbound message into an [`Assertion`]. Starting a flow has a default
//! implementation that writes an `AuthnRequest` with the configured binding.

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, StatusCode};
use idc_core::config::SamlIdpConfig;
use idc_idp::ResponseCapture;

use crate::bindings::{HttpPostBinding, HttpRedirectBinding, InboundMessage};
use crate::error::{SamlError, SamlResult};
use crate::types::{Assertion, AuthnRequest, NameIdFormat, NameIdPolicy, SamlBinding};

/// Static configuration of this service provider towards one IdP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProviderConfig {
    /// Entity ID of this service provider.
    pub entity_id: String,
    /// Assertion consumer service URL.
    pub acs_url: String,
    /// Single sign-on URL of the identity provider.
    pub idp_sso_url: String,
    /// Binding used to send the `AuthnRequest`.
    pub idp_binding: SamlBinding,
    /// NameID format requested in the `AuthnRequest`.
    pub name_id_format: Option<NameIdFormat>,
}

impl ServiceProviderConfig {
    /// Builds the configuration from an IdP connection.
    pub fn from_idp_config(config: &SamlIdpConfig) -> SamlResult<Self> {
        let name_id_format = config
            .name_id_format
            .as_deref()
            .map(|uri| {
                NameIdFormat::from_uri(uri).ok_or_else(|| {
                    SamlError::InvalidRequest(format!("unsupported NameID format '{uri}'"))
                })
            })
            .transpose()?;

        Ok(Self {
            entity_id: config.sp_entity_id.clone(),
            acs_url: config.acs_url.clone(),
            idp_sso_url: config.idp_sso_url.clone(),
            idp_binding: config.binding.into(),
            name_id_format,
        })
    }

    /// Builds the `AuthnRequest` for one login attempt.
    #[must_use]
    pub fn authn_request(&self, request_id: &str) -> AuthnRequest {
        let request = AuthnRequest::new(request_id, &self.entity_id)
            .with_acs_url(&self.acs_url)
            .with_destination(&self.idp_sso_url)
            .with_binding(SamlBinding::HttpPost);

        match self.name_id_format {
            Some(format) => {
                request.with_name_id_policy(NameIdPolicy::with_format(format).allow_create(true))
            }
            None => request,
        }
    }
}

/// The SAML protocol library, as seen by a session.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Returns the service provider configuration.
    fn config(&self) -> &ServiceProviderConfig;

    /// Parses and validates a response.
    ///
    /// `possible_request_ids` are the request IDs the response may answer;
    /// a response to any other request must be rejected.
    ///
    /// ## Errors
    ///
    /// - `SamlError::InvalidResponse` / `SignatureInvalid` when validation
    ///   rejects the response (replay, `InResponseTo`, audience, signature)
    /// - decoding and XML errors when the message is malformed
    async fn parse_response(
        &self,
        message: &InboundMessage,
        possible_request_ids: &[String],
    ) -> SamlResult<Assertion>;

    /// Writes the start of an authentication flow to `sink`.
    ///
    /// The default sends an `AuthnRequest` whose ID is `request_id` with the
    /// configured binding: HTTP-Redirect sets `Location`, HTTP-POST writes a
    /// self-submitting form.
    fn handle_start_auth_flow(
        &self,
        sink: &mut ResponseCapture,
        request_id: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<()> {
        write_authn_request(self.config(), sink, request_id, relay_state)
    }
}

/// Writes an `AuthnRequest` for `request_id` using the configured binding.
pub fn write_authn_request(
    config: &ServiceProviderConfig,
    sink: &mut ResponseCapture,
    request_id: &str,
    relay_state: Option<&str>,
) -> SamlResult<()> {
    let xml = config.authn_request(request_id).to_xml()?;

    match config.idp_binding {
        SamlBinding::HttpRedirect => {
            let url = HttpRedirectBinding::encode_request(&xml, &config.idp_sso_url, relay_state)?;
            let location = HeaderValue::from_str(&url)
                .map_err(|e| SamlError::Internal(format!("invalid redirect URL: {e}")))?;
            sink.set_status(StatusCode::FOUND);
            sink.insert_header(LOCATION, location);
        }
        SamlBinding::HttpPost => {
            let html = HttpPostBinding::encode_request(&xml, &config.idp_sso_url, relay_state);
            sink.set_status(StatusCode::OK);
            sink.insert_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            sink.write(html.as_bytes());
        }
    }
    Ok(())
}
