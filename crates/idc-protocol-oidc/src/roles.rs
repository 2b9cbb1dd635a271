//! Role-organization lookup.

use std::sync::Arc;

use idc_model::{OrgState, Organization};
use idc_storage::{OrgColumn, OrgCondition, OrganizationProvider, QueryOptions, SortOrder, StorageResult};

use crate::scope::role_org_ids_from_scopes;

/// Resolves role-organization IDs to organizations of one instance.
#[derive(Clone)]
pub struct RoleOrganizationResolver {
    organizations: Arc<dyn OrganizationProvider>,
}

impl RoleOrganizationResolver {
    /// Creates a resolver over an organization repository.
    #[must_use]
    pub fn new(organizations: Arc<dyn OrganizationProvider>) -> Self {
        Self { organizations }
    }

    /// Returns the active organizations of `instance_id` among `org_ids`.
    ///
    /// Results follow the order of `org_ids`; repeated IDs yield one entry.
    /// Unknown and inactive IDs are skipped.
    pub async fn resolve(
        &self,
        instance_id: &str,
        org_ids: &[String],
    ) -> StorageResult<Vec<Organization>> {
        if org_ids.is_empty() {
            return Ok(Vec::new());
        }

        let options = QueryOptions::new()
            .filter(OrgCondition::and([
                OrgCondition::InstanceId(instance_id.to_string()),
                OrgCondition::IdIn(org_ids.to_vec()),
            ]))
            .order_by(OrgColumn::Id, SortOrder::Asc);
        let found = self.organizations.list(&options).await?;

        let mut resolved: Vec<Organization> = Vec::with_capacity(found.len());
        for id in org_ids {
            if resolved.iter().any(|org| org.id == *id) {
                continue;
            }
            match found.iter().find(|org| org.id == *id) {
                Some(org) if org.state == OrgState::Active => resolved.push(org.clone()),
                Some(_) => tracing::debug!(org_id = %id, instance_id, "skipping inactive role organization"),
                None => tracing::debug!(org_id = %id, instance_id, "skipping unknown role organization"),
            }
        }
        Ok(resolved)
    }

    /// Extracts role-organization scopes and resolves them.
    pub async fn resolve_scopes<S: AsRef<str> + Sync>(
        &self,
        instance_id: &str,
        scopes: &[S],
    ) -> StorageResult<Vec<Organization>> {
        self.resolve(instance_id, &role_org_ids_from_scopes(scopes))
            .await
    }
}

impl std::fmt::Debug for RoleOrganizationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleOrganizationResolver").finish_non_exhaustive()
    }
}
