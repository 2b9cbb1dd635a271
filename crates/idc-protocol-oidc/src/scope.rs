//! Scope grammar and audience computation.
//!
//! Three scope shapes carry meaning for token issuance:
//!
//! | Pattern | Shape | Effect |
//! |---|---|---|
//! | project audience | `urn:zitadel:iam:org:project:id:<projectID>:aud` | append `projectID` to the audience |
//! | client audience | `<clientID>:aud` | replace the audience with `[clientID]` |
//! | role organization | `urn:zitadel:iam:org:roles:id:<orgID>` | attach role claims for `orgID` |
//!
//! Each scope is matched against the patterns in the order of the table and
//! the first match wins. Every other scope is ignored.

use idc_core::config::{ScopeConfig, DEFAULT_RESERVED_PROJECT_ALIAS};

/// Prefix of a project-audience scope.
pub const PROJECT_AUDIENCE_PREFIX: &str = "urn:zitadel:iam:org:project:id:";

/// Suffix of project-audience and client-audience scopes.
pub const AUDIENCE_SUFFIX: &str = ":aud";

/// Prefix of a role-organization scope.
pub const ROLE_ORGANIZATION_PREFIX: &str = "urn:zitadel:iam:org:roles:id:";

/// A recognized scope, borrowing its ID from the scope string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePattern<'a> {
    /// `<prefix><projectID><suffix>`
    ProjectAudience(&'a str),
    /// `<clientID><suffix>` without the project prefix
    ClientAudience(&'a str),
    /// `<prefix><orgID>`
    RoleOrganization(&'a str),
}

impl<'a> ScopePattern<'a> {
    /// Classifies a scope. Returns `None` for scopes without meaning here.
    ///
    /// A scope with the project prefix is never a client audience, even when
    /// its project ID is empty.
    #[must_use]
    pub fn parse(scope: &'a str) -> Option<Self> {
        if let Some(rest) = scope.strip_prefix(PROJECT_AUDIENCE_PREFIX) {
            return rest
                .strip_suffix(AUDIENCE_SUFFIX)
                .filter(|id| !id.is_empty())
                .map(Self::ProjectAudience);
        }
        if let Some(client_id) = scope.strip_suffix(AUDIENCE_SUFFIX) {
            if !client_id.is_empty() {
                return Some(Self::ClientAudience(client_id));
            }
        }
        scope
            .strip_prefix(ROLE_ORGANIZATION_PREFIX)
            .filter(|id| !id.is_empty())
            .map(Self::RoleOrganization)
    }

    /// Returns the ID carried by the scope.
    #[must_use]
    pub const fn id(&self) -> &'a str {
        match *self {
            Self::ProjectAudience(id) | Self::ClientAudience(id) | Self::RoleOrganization(id) => id,
        }
    }
}

/// Instance-specific inputs of the audience computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceContext {
    instance_project_id: Option<String>,
    reserved_project_alias: String,
}

impl Default for AudienceContext {
    fn default() -> Self {
        Self {
            instance_project_id: None,
            reserved_project_alias: DEFAULT_RESERVED_PROJECT_ALIAS.to_string(),
        }
    }
}

impl AudienceContext {
    /// Creates a context resolving the default alias to `instance_project_id`.
    #[must_use]
    pub fn new(instance_project_id: impl Into<String>) -> Self {
        Self {
            instance_project_id: Some(instance_project_id.into()),
            ..Self::default()
        }
    }

    /// Creates a context from configuration.
    #[must_use]
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self {
            instance_project_id: config.instance_project_id.clone(),
            reserved_project_alias: config.reserved_project_alias.clone(),
        }
    }

    /// Overrides the reserved alias.
    #[must_use]
    pub fn with_reserved_alias(mut self, alias: impl Into<String>) -> Self {
        self.reserved_project_alias = alias.into();
        self
    }

    /// Returns the project ID a project-audience scope contributes.
    #[must_use]
    pub fn project_id<'a>(&'a self, id: &'a str) -> &'a str {
        match &self.instance_project_id {
            Some(project_id) if id == self.reserved_project_alias => project_id,
            _ => id,
        }
    }

    /// Computes the token audience from the initial audience and the
    /// requested scopes.
    ///
    /// Project-audience scopes append (without de-duplication). A
    /// client-audience scope replaces everything accumulated so far, so the
    /// last one wins and later project audiences append to it.
    #[must_use]
    pub fn compute_audience<S: AsRef<str>>(&self, initial: &[String], scopes: &[S]) -> Vec<String> {
        let mut audience = initial.to_vec();
        for scope in scopes {
            match ScopePattern::parse(scope.as_ref()) {
                Some(ScopePattern::ProjectAudience(id)) => {
                    audience.push(self.project_id(id).to_string());
                }
                Some(ScopePattern::ClientAudience(client_id)) => {
                    tracing::trace!(client_id, "client audience replaces token audience");
                    audience = vec![client_id.to_string()];
                }
                _ => {}
            }
        }
        audience
    }
}

/// Computes the token audience without alias resolution.
///
/// See [`AudienceContext::compute_audience`].
#[must_use]
pub fn compute_audience<S: AsRef<str>>(initial: &[String], scopes: &[S]) -> Vec<String> {
    AudienceContext::default().compute_audience(initial, scopes)
}

/// Returns the organization IDs of all role-organization scopes, in order.
#[must_use]
pub fn role_org_ids_from_scopes<S: AsRef<str>>(scopes: &[S]) -> Vec<String> {
    scopes
        .iter()
        .filter_map(|scope| match ScopePattern::parse(scope.as_ref()) {
            Some(ScopePattern::RoleOrganization(org_id)) => Some(org_id.to_string()),
            _ => None,
        })
        .collect()
}
