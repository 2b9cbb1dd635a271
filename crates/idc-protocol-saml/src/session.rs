//! SAML implementation of the identity provider session.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use idc_core::event::{Event, EventType};
use idc_idp::{
    AuthAction, FetchUserError, IdpError, IdpResult, IdpSession, RequestContext, ResponseCapture,
    SessionState,
};
use idc_model::ResolvedIdentity;

use crate::bindings::InboundMessage;
use crate::error::SamlError;
use crate::provider::SamlProviderConfig;
use crate::resolve::{
    flatten_attributes, resolve_name_id, CODE_REQUEST_MISSING, CODE_RESPONSE_MALFORMED,
    CODE_RESPONSE_REJECTED, CODE_SESSION_CONSUMED, CODE_UPSTREAM,
};
use crate::sp::ServiceProvider;
use crate::types::Assertion;

/// One SAML login attempt.
///
/// Created by [`SamlProvider::new_session`](crate::SamlProvider::new_session).
/// Not shared between requests; a failed attempt is terminal.
pub struct SamlSession {
    config: SamlProviderConfig,
    service_provider: Arc<dyn ServiceProvider>,
    request_id: String,
    message: Option<InboundMessage>,
    state: SessionState,
    assertion: Option<Assertion>,
}

impl SamlSession {
    pub(crate) fn new(
        config: SamlProviderConfig,
        service_provider: Arc<dyn ServiceProvider>,
        request_id: String,
        message: Option<InboundMessage>,
    ) -> Self {
        tracing::debug!(
            provider = %config.name,
            request_id = %request_id,
            has_message = message.is_some(),
            "SAML session created"
        );
        Self {
            config,
            service_provider,
            request_id,
            message,
            state: SessionState::Initiated,
            assertion: None,
        }
    }

    /// Attaches the callback message.
    pub fn set_inbound_message(&mut self, message: InboundMessage) {
        self.message = Some(message);
    }

    /// Returns the request correlation ID.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the validated assertion once a response has been parsed.
    #[must_use]
    pub const fn assertion(&self) -> Option<&Assertion> {
        self.assertion.as_ref()
    }

    fn consumed_error(&self) -> IdpError {
        IdpError::invalid_argument(
            CODE_SESSION_CONSUMED,
            format!("session already {}", self.state),
        )
    }

    async fn complete(&mut self, ctx: &RequestContext) -> Result<ResolvedIdentity, FetchUserError> {
        let message = match self.message.as_ref() {
            Some(message) if !self.request_id.is_empty() => message,
            _ => {
                return Err(IdpError::invalid_argument(
                    CODE_REQUEST_MISSING,
                    "request ID and inbound message are required",
                )
                .into())
            }
        };

        let ctx = match self.config.response_timeout {
            Some(timeout) => ctx.bounded(timeout),
            None => ctx.clone(),
        };
        let possible_request_ids = [self.request_id.clone()];
        let assertion = ctx
            .run(
                self.service_provider
                    .parse_response(message, &possible_request_ids),
            )
            .await
            .map_err(IdpError::from)?
            .map_err(|err| response_error(&self.config.name, err))?;

        let attributes = flatten_attributes(&assertion);
        let resolved = resolve_name_id(
            &assertion,
            self.config.transient_mapping_attribute_name.as_deref(),
        );
        self.assertion = Some(assertion);

        match resolved {
            Ok(id) => Ok(ResolvedIdentity::new(id, attributes)),
            Err(error) => {
                tracing::warn!(
                    provider = %self.config.name,
                    request_id = %self.request_id,
                    code = error.code(),
                    "no usable subject in SAML assertion"
                );
                Err(FetchUserError::with_user(
                    error,
                    ResolvedIdentity::unidentified(attributes),
                ))
            }
        }
    }

    fn audit(&self, result: &Result<ResolvedIdentity, FetchUserError>) {
        let builder = Event::builder(match result {
            Ok(_) => EventType::IdpIntentSucceeded,
            Err(_) => EventType::IdpIntentFailed,
        })
        .provider(&self.config.name)
        .request(&self.request_id);

        let event = match result {
            Ok(user) => builder
                .success()
                .subject(user.id().unwrap_or_default())
                .detail("attributes", user.attributes().len().to_string()),
            Err(failure) => {
                let builder = builder
                    .failure(failure.error().code())
                    .detail("kind", failure.kind().as_str());
                match failure.error() {
                    IdpError::AmbiguousMapping {
                        attribute,
                        value_count,
                        ..
                    } => builder
                        .detail("attribute", attribute.clone())
                        .detail("value_count", value_count.to_string()),
                    _ => builder,
                }
            }
        };
        event.build().emit();
    }
}

/// Maps a protocol library failure onto the session error kinds.
fn response_error(provider: &str, err: SamlError) -> IdpError {
    tracing::warn!(provider, error = %err, "SAML response not accepted");
    if err.is_rejection() {
        IdpError::invalid_argument_from(CODE_RESPONSE_REJECTED, "SAML response rejected", err)
    } else if err.is_malformed() {
        IdpError::invalid_argument_from(CODE_RESPONSE_MALFORMED, "SAML response malformed", err)
    } else {
        IdpError::upstream(CODE_UPSTREAM, "SAML response could not be processed", Some(err.into()))
    }
}

#[async_trait]
impl IdpSession for SamlSession {
    async fn initiate_auth(&mut self, ctx: &RequestContext) -> IdpResult<AuthAction> {
        if self.state.is_terminal() {
            return Err(self.consumed_error());
        }
        if self.request_id.is_empty() {
            return Err(IdpError::invalid_argument(
                CODE_REQUEST_MISSING,
                "request ID is required",
            ));
        }
        if let Some(reason) = ctx.interrupted() {
            return Err(reason.into());
        }

        let mut sink = ResponseCapture::new();
        self.service_provider
            .handle_start_auth_flow(&mut sink, &self.request_id, self.config.relay_state.as_deref())
            .map_err(|err| {
                IdpError::upstream(
                    CODE_UPSTREAM,
                    "could not start SAML authentication",
                    Some(err.into()),
                )
            })?;

        let action = sink.into_action();
        self.state = SessionState::AwaitingResponse;

        tracing::debug!(
            provider = %self.config.name,
            request_id = %self.request_id,
            redirect = matches!(action, AuthAction::Redirect(_)),
            "SAML authentication initiated"
        );
        Event::builder(EventType::IdpIntentStarted)
            .success()
            .provider(&self.config.name)
            .request(&self.request_id)
            .build()
            .emit();

        Ok(action)
    }

    async fn fetch_user(
        &mut self,
        ctx: &RequestContext,
    ) -> Result<ResolvedIdentity, FetchUserError> {
        if self.state.is_terminal() {
            return Err(self.consumed_error().into());
        }

        let result = self.complete(ctx).await;
        self.state = if result.is_ok() {
            SessionState::Resolved
        } else {
            SessionState::Failed
        };
        self.audit(&result);
        result
    }

    fn state(&self) -> SessionState {
        self.state
    }
}

impl fmt::Debug for SamlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlSession")
            .field("provider", &self.config.name)
            .field("request_id", &self.request_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
