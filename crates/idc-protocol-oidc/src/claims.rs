//! Token claims derived from requested scopes.
//!
//! Implements the `aud` claim shape of RFC 7519 (a single string or an array).

use idc_core::event::{Event, EventType};
use serde::{Deserialize, Serialize};

use crate::scope::{role_org_ids_from_scopes, AudienceContext};

/// Audience claim (can be a single string or array).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience.
    Single(String),
    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Checks if the audience contains a specific value.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multiple(v) => v.iter().any(|s| s == value),
        }
    }

    /// Returns the audiences as a vector.
    #[must_use]
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

impl From<String> for Audience {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<&str> for Audience {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<Vec<String>> for Audience {
    fn from(mut v: Vec<String>) -> Self {
        if v.len() == 1 {
            if let Some(single) = v.pop() {
                return Self::Single(single);
            }
        }
        Self::Multiple(v)
    }
}

/// Audience and role-organization claims of one token request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeClaims {
    /// Token audience, in order, duplicates kept.
    pub audience: Vec<String>,
    /// Organizations whose role claims must be attached.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_org_ids: Vec<String>,
}

impl ScopeClaims {
    /// Returns the `aud` claim value, or `None` for an empty audience.
    #[must_use]
    pub fn aud(&self) -> Option<Audience> {
        if self.audience.is_empty() {
            None
        } else {
            Some(self.audience.clone().into())
        }
    }

    /// Builds the audit event recording this resolution for `client_id`.
    #[must_use]
    pub fn event(&self, client_id: &str) -> Event {
        Event::builder(EventType::TokenAudienceResolved)
            .success()
            .request(client_id)
            .detail("audience", self.audience.join(" "))
            .detail("role_orgs", self.role_org_ids.join(" "))
            .build()
    }
}

/// Resolves both claim sets from the requested scopes.
#[must_use]
pub fn resolve_scope_claims<S: AsRef<str>>(
    initial_audience: &[String],
    scopes: &[S],
    ctx: &AudienceContext,
) -> ScopeClaims {
    let claims = ScopeClaims {
        audience: ctx.compute_audience(initial_audience, scopes),
        role_org_ids: role_org_ids_from_scopes(scopes),
    };
    tracing::debug!(
        audience = ?claims.audience,
        role_orgs = claims.role_org_ids.len(),
        "scope claims resolved"
    );
    claims
}
