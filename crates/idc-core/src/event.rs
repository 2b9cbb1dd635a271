//! Audit events for identity resolution.
//!
//! Every federated login attempt produces an event when it starts and when
//! it completes. Events include:
//! - Timestamp (ISO 8601)
//! - Event type and outcome
//! - Identity provider and request correlation ID
//! - Resolved subject (when available)
//! - Stable error code (for failure events)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Authentication request handed to the browser.
    IdpIntentStarted,
    /// Identity resolved from the IdP response.
    IdpIntentSucceeded,
    /// IdP response rejected or no usable identity.
    IdpIntentFailed,
    /// Token audience and role organizations computed from scopes.
    TokenAudienceResolved,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event (ISO 8601).
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Identity provider connection name.
    pub provider: Option<String>,

    /// Request correlation ID of the authentication attempt.
    pub request_id: Option<String>,

    /// Resolved subject identifier.
    pub subject: Option<String>,

    /// Stable error code (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event to the `audit` tracing target.
    pub fn emit(&self) {
        let details = self
            .details
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");

        match self.outcome {
            EventOutcome::Success => tracing::info!(
                target: "audit",
                event_id = %self.id,
                event_type = ?self.event_type,
                provider = self.provider.as_deref(),
                request_id = self.request_id.as_deref(),
                subject = self.subject.as_deref(),
                details = %details,
                "audit event"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: "audit",
                event_id = %self.id,
                event_type = ?self.event_type,
                provider = self.provider.as_deref(),
                request_id = self.request_id.as_deref(),
                error = self.error.as_deref(),
                details = %details,
                "audit event"
            ),
        }
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    provider: Option<String>,
    request_id: Option<String>,
    subject: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            provider: None,
            request_id: None,
            subject: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error code.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the identity provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the request correlation ID.
    #[must_use]
    pub fn request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the resolved subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            provider: self.provider,
            request_id: self.request_id,
            subject: self.subject,
            error: self.error,
            details: self.details,
        }
    }
}
