//! Organization domain model.
//!
//! Organizations live inside an instance and are identified either by
//! `(instance_id, id)` or `(instance_id, name)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgState {
    /// The organization is usable.
    #[default]
    Active,
    /// The organization is deactivated.
    Inactive,
}

impl OrgState {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Organization ID, unique within the instance.
    pub id: String,
    /// Organization name, unique within the instance.
    pub name: String,
    /// Instance the organization belongs to.
    pub instance_id: String,
    /// Lifecycle state.
    pub state: OrgState,
    /// When the organization was created.
    pub created_at: DateTime<Utc>,
    /// When the organization was last updated.
    pub updated_at: DateTime<Utc>,
    /// Domains registered for the organization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<OrganizationDomain>,
}

impl Organization {
    /// Creates a new active organization.
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            instance_id: instance_id.into(),
            state: OrgState::Active,
            created_at: now,
            updated_at: now,
            domains: Vec::new(),
        }
    }

    /// Sets the state.
    #[must_use]
    pub const fn with_state(mut self, state: OrgState) -> Self {
        self.state = state;
        self
    }

    /// Adds a domain.
    #[must_use]
    pub fn with_domain(mut self, domain: OrganizationDomain) -> Self {
        self.domains.push(domain);
        self
    }

    /// Returns whether the organization is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == OrgState::Active
    }

    /// Returns the primary domain, if any.
    #[must_use]
    pub fn primary_domain(&self) -> Option<&OrganizationDomain> {
        self.domains.iter().find(|d| d.is_primary)
    }
}

/// A domain registered for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDomain {
    /// The domain name.
    pub domain: String,
    /// Whether ownership of the domain has been verified.
    pub is_verified: bool,
    /// Whether this is the organization's primary domain.
    pub is_primary: bool,
}

impl OrganizationDomain {
    /// Creates an unverified, non-primary domain.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            is_verified: false,
            is_primary: false,
        }
    }

    /// Marks the domain as verified.
    #[must_use]
    pub const fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    /// Marks the domain as primary.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// Input for creating an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Organization name.
    pub name: String,
}
