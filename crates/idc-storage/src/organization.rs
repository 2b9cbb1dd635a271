//! Organization storage provider traits.

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use idc_model::{OrgState, Organization};

use crate::error::StorageResult;

/// Table name used for qualified column references.
pub const ORGANIZATIONS_TABLE: &str = "organizations";

// ============================================================================
// Columns
// ============================================================================

/// Columns of the organizations table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgColumn {
    /// The `id` column.
    Id,
    /// The `name` column.
    Name,
    /// The `instance_id` column.
    InstanceId,
    /// The `state` column.
    State,
    /// The `created_at` column.
    CreatedAt,
    /// The `updated_at` column.
    UpdatedAt,
}

impl OrgColumn {
    /// Returns the column name.
    ///
    /// `qualified` prefixes the name with the table name.
    #[must_use]
    pub fn name(&self, qualified: bool) -> String {
        let column = match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::InstanceId => "instance_id",
            Self::State => "state",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        };
        if qualified {
            format!("{ORGANIZATIONS_TABLE}.{column}")
        } else {
            column.to_string()
        }
    }

    /// Compares two organizations by this column.
    #[must_use]
    pub fn compare(&self, a: &Organization, b: &Organization) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Name => a.name.cmp(&b.name),
            Self::InstanceId => a.instance_id.cmp(&b.instance_id),
            Self::State => a.state.as_str().cmp(b.state.as_str()),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Identifies a single organization within an instance, by ID or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgIdentifier {
    /// Organization ID.
    Id(String),
    /// Organization name.
    Name(String),
}

impl OrgIdentifier {
    /// Returns whether the organization matches this identifier.
    #[must_use]
    pub fn matches(&self, org: &Organization) -> bool {
        match self {
            Self::Id(id) => org.id == *id,
            Self::Name(name) => org.name == *name,
        }
    }
}

impl fmt::Display for OrgIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id = '{id}'"),
            Self::Name(name) => write!(f, "name = '{name}'"),
        }
    }
}

/// Filter conditions on organizations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgCondition {
    /// Equal filter on the ID.
    Id(String),
    /// Equal filter on the name.
    Name(String),
    /// Equal filter on the instance ID.
    InstanceId(String),
    /// Equal filter on the state.
    State(OrgState),
    /// ID is one of the given values.
    IdIn(Vec<String>),
    /// All conditions hold.
    And(Vec<OrgCondition>),
    /// Any condition holds.
    Or(Vec<OrgCondition>),
}

impl OrgCondition {
    /// Combines conditions with AND.
    #[must_use]
    pub fn and(conditions: impl IntoIterator<Item = Self>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    /// Combines conditions with OR.
    #[must_use]
    pub fn or(conditions: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    /// Evaluates the condition against an organization.
    #[must_use]
    pub fn matches(&self, org: &Organization) -> bool {
        match self {
            Self::Id(id) => org.id == *id,
            Self::Name(name) => org.name == *name,
            Self::InstanceId(instance_id) => org.instance_id == *instance_id,
            Self::State(state) => org.state == *state,
            Self::IdIn(ids) => ids.iter().any(|id| org.id == *id),
            Self::And(conditions) => conditions.iter().all(|c| c.matches(org)),
            Self::Or(conditions) => conditions.iter().any(|c| c.matches(org)),
        }
    }
}

impl From<OrgIdentifier> for OrgCondition {
    fn from(identifier: OrgIdentifier) -> Self {
        match identifier {
            OrgIdentifier::Id(id) => Self::Id(id),
            OrgIdentifier::Name(name) => Self::Name(name),
        }
    }
}

impl fmt::Display for OrgCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id = '{id}'"),
            Self::Name(name) => write!(f, "name = '{name}'"),
            Self::InstanceId(id) => write!(f, "instance_id = '{id}'"),
            Self::State(state) => write!(f, "state = '{}'", state.as_str()),
            Self::IdIn(ids) => write!(f, "id IN ({})", ids.join(", ")),
            Self::And(conditions) => write_joined(f, conditions, "AND"),
            Self::Or(conditions) => write_joined(f, conditions, "OR"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[OrgCondition], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{condition}")?;
    }
    write!(f, ")")
}

// ============================================================================
// Changes
// ============================================================================

/// Column updates applied by [`OrganizationProvider::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgChange {
    /// Sets the name column.
    SetName(String),
    /// Sets the state column.
    SetState(OrgState),
}

impl OrgChange {
    /// Returns the column this change writes.
    #[must_use]
    pub const fn column(&self) -> OrgColumn {
        match self {
            Self::SetName(_) => OrgColumn::Name,
            Self::SetState(_) => OrgColumn::State,
        }
    }

    /// Applies the change to an organization.
    pub fn apply(&self, org: &mut Organization) {
        match self {
            Self::SetName(name) => org.name.clone_from(name),
            Self::SetState(state) => org.state = *state,
        }
    }
}

// ============================================================================
// Query options
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Options for [`OrganizationProvider::get`] and [`OrganizationProvider::list`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Filter condition.
    pub condition: Option<OrgCondition>,
    /// Sort column and direction.
    pub order_by: Option<(OrgColumn, SortOrder)>,
    /// Maximum results to return.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl QueryOptions {
    /// Creates options without any filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            condition: None,
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    /// Filters with the given condition.
    #[must_use]
    pub fn filter(mut self, condition: OrgCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Sorts by the given column.
    #[must_use]
    pub const fn order_by(mut self, column: OrgColumn, order: SortOrder) -> Self {
        self.order_by = Some((column, order));
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns whether the organization passes the filter.
    #[must_use]
    pub fn matches(&self, org: &Organization) -> bool {
        self.condition.as_ref().map_or(true, |c| c.matches(org))
    }

    /// Describes the filter for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        self.condition
            .as_ref()
            .map_or_else(|| "(all)".to_string(), ToString::to_string)
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Provider for organization storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait OrganizationProvider: Send + Sync {
    /// Gets exactly one organization matching the options.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if nothing matches and
    /// `StorageError::MultipleRows` if more than one organization matches.
    async fn get(&self, options: &QueryOptions) -> StorageResult<Organization>;

    /// Lists organizations matching the options.
    async fn list(&self, options: &QueryOptions) -> StorageResult<Vec<Organization>>;

    /// Creates an organization.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the ID is already taken in any
    /// instance, or the name within the instance.
    async fn create(&self, organization: &Organization) -> StorageResult<()>;

    /// Applies changes to one organization and returns the affected row count.
    async fn update(
        &self,
        id: &OrgIdentifier,
        instance_id: &str,
        changes: &[OrgChange],
    ) -> StorageResult<u64>;

    /// Deletes one organization and returns the affected row count.
    async fn delete(&self, id: &OrgIdentifier, instance_id: &str) -> StorageResult<u64>;
}

/// Provider for organization memberships.
#[async_trait]
pub trait MemberProvider: Send + Sync {
    /// Adds a user to an organization with the given roles.
    async fn add_member(&self, org_id: &str, user_id: &str, roles: &[String]) -> StorageResult<()>;

    /// Replaces the roles of an existing member.
    async fn set_member_roles(
        &self,
        org_id: &str,
        user_id: &str,
        roles: &[String],
    ) -> StorageResult<()>;

    /// Removes a user from an organization.
    async fn remove_member(&self, org_id: &str, user_id: &str) -> StorageResult<()>;

    /// Returns the roles of a member, if the user is a member.
    async fn member_roles(&self, org_id: &str, user_id: &str) -> StorageResult<Option<Vec<String>>>;
}
