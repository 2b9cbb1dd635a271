//! In-memory storage backend.
//!
//! Evaluates the typed query descriptors directly against a process-local
//! table. Used by tests and by single-node development setups.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use idc_model::Organization;
use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::organization::{
    MemberProvider, OrgChange, OrgIdentifier, OrganizationProvider, QueryOptions, SortOrder,
};

const ENTITY: &str = "Organization";
const MEMBER_ENTITY: &str = "OrganizationMember";

/// In-memory organization and membership store.
#[derive(Debug, Default)]
pub struct MemoryOrganizationStore {
    organizations: RwLock<Vec<Organization>>,
    /// Keyed by `(org_id, user_id)`.
    members: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl MemoryOrganizationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with organizations; no uniqueness checks are made.
    #[must_use]
    pub fn with_organizations(organizations: Vec<Organization>) -> Self {
        Self {
            organizations: RwLock::new(organizations),
            members: RwLock::default(),
        }
    }

    fn find_index(
        organizations: &[Organization],
        id: &OrgIdentifier,
        instance_id: &str,
    ) -> Option<usize> {
        organizations
            .iter()
            .position(|org| org.instance_id == instance_id && id.matches(org))
    }
}

#[async_trait]
impl OrganizationProvider for MemoryOrganizationStore {
    async fn get(&self, options: &QueryOptions) -> StorageResult<Organization> {
        let mut matches = self.list(options).await?;
        match matches.len() {
            0 => Err(StorageError::not_found(ENTITY, options.describe())),
            1 => Ok(matches.remove(0)),
            count => Err(StorageError::MultipleRows {
                entity_type: ENTITY,
                count,
                criteria: options.describe(),
            }),
        }
    }

    async fn list(&self, options: &QueryOptions) -> StorageResult<Vec<Organization>> {
        let mut result: Vec<Organization> = self
            .organizations
            .read()
            .iter()
            .filter(|org| options.matches(org))
            .cloned()
            .collect();

        if let Some((column, order)) = options.order_by {
            result.sort_by(|a, b| {
                let ordering = column.compare(a, b);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let offset = options.offset.unwrap_or(0);
        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(result.into_iter().skip(offset).take(limit).collect())
    }

    async fn create(&self, organization: &Organization) -> StorageResult<()> {
        if organization.id.is_empty() || organization.instance_id.is_empty() {
            return Err(StorageError::InvalidData(
                "organization id and instance id are required".to_string(),
            ));
        }

        // ids are unique across instances; members are keyed by org id alone
        let mut organizations = self.organizations.write();
        for existing in organizations.iter() {
            if existing.id == organization.id {
                return Err(StorageError::duplicate(ENTITY, "id", &organization.id));
            }
            if existing.instance_id == organization.instance_id
                && existing.name == organization.name
            {
                return Err(StorageError::duplicate(ENTITY, "name", &organization.name));
            }
        }
        organizations.push(organization.clone());

        tracing::debug!(
            org_id = %organization.id,
            instance_id = %organization.instance_id,
            "organization created"
        );
        Ok(())
    }

    async fn update(
        &self,
        id: &OrgIdentifier,
        instance_id: &str,
        changes: &[OrgChange],
    ) -> StorageResult<u64> {
        let mut organizations = self.organizations.write();
        let Some(index) = Self::find_index(&organizations, id, instance_id) else {
            return Ok(0);
        };

        for change in changes {
            if let OrgChange::SetName(name) = change {
                let taken = organizations.iter().enumerate().any(|(i, o)| {
                    i != index && o.instance_id == instance_id && o.name == *name
                });
                if taken {
                    return Err(StorageError::duplicate(ENTITY, "name", name));
                }
            }
        }

        let organization = &mut organizations[index];
        for change in changes {
            change.apply(organization);
        }
        organization.updated_at = Utc::now();
        Ok(1)
    }

    async fn delete(&self, id: &OrgIdentifier, instance_id: &str) -> StorageResult<u64> {
        let mut organizations = self.organizations.write();
        let Some(index) = Self::find_index(&organizations, id, instance_id) else {
            return Ok(0);
        };
        let removed = organizations.remove(index);
        drop(organizations);

        self.members
            .write()
            .retain(|(org_id, _), _| *org_id != removed.id);
        Ok(1)
    }
}

#[async_trait]
impl MemberProvider for MemoryOrganizationStore {
    async fn add_member(&self, org_id: &str, user_id: &str, roles: &[String]) -> StorageResult<()> {
        let exists = self.organizations.read().iter().any(|o| o.id == org_id);
        if !exists {
            return Err(StorageError::not_found(ENTITY, format!("id = '{org_id}'")));
        }

        let mut members = self.members.write();
        let key = (org_id.to_string(), user_id.to_string());
        if members.contains_key(&key) {
            return Err(StorageError::duplicate(MEMBER_ENTITY, "user_id", user_id));
        }
        members.insert(key, roles.to_vec());
        Ok(())
    }

    async fn set_member_roles(
        &self,
        org_id: &str,
        user_id: &str,
        roles: &[String],
    ) -> StorageResult<()> {
        let mut members = self.members.write();
        let key = (org_id.to_string(), user_id.to_string());
        let entry = members.get_mut(&key).ok_or_else(|| {
            StorageError::not_found(MEMBER_ENTITY, format!("org_id = '{org_id}', user_id = '{user_id}'"))
        })?;
        *entry = roles.to_vec();
        Ok(())
    }

    async fn remove_member(&self, org_id: &str, user_id: &str) -> StorageResult<()> {
        let key = (org_id.to_string(), user_id.to_string());
        self.members.write().remove(&key).map(|_| ()).ok_or_else(|| {
            StorageError::not_found(MEMBER_ENTITY, format!("org_id = '{org_id}', user_id = '{user_id}'"))
        })
    }

    async fn member_roles(&self, org_id: &str, user_id: &str) -> StorageResult<Option<Vec<String>>> {
        let key = (org_id.to_string(), user_id.to_string());
        Ok(self.members.read().get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use idc_model::OrgState;

    use super::*;
    use crate::organization::{OrgColumn, OrgCondition};

    fn seeded() -> MemoryOrganizationStore {
        MemoryOrganizationStore::with_organizations(vec![
            Organization::new("inst-1", "100", "ACME"),
            Organization::new("inst-1", "200", "Globex").with_state(OrgState::Inactive),
            Organization::new("inst-2", "300", "ACME"),
        ])
    }

    #[tokio::test]
    async fn create_rejects_duplicates_within_instance() {
        let store = seeded();

        let err = store
            .create(&Organization::new("inst-1", "101", "ACME"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        let err = store
            .create(&Organization::new("inst-1", "100", "Initech"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        store
            .create(&Organization::new("inst-3", "101", "ACME"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn org_ids_are_unique_across_instances() {
        let store = seeded();
        store
            .add_member("100", "alice", &["ORG_OWNER".to_string()])
            .await
            .unwrap();

        let err = store
            .create(&Organization::new("inst-2", "100", "Initech"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        // deleting in another instance leaves the org and its members alone
        let removed = store
            .delete(&OrgIdentifier::Id("100".to_string()), "inst-2")
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(
            store.member_roles("100", "alice").await.unwrap(),
            Some(vec!["ORG_OWNER".to_string()])
        );
    }

    #[tokio::test]
    async fn get_requires_exactly_one_match() {
        let store = seeded();

        let by_name = QueryOptions::new().filter(OrgCondition::Name("ACME".to_string()));
        let err = store.get(&by_name).await.unwrap_err();
        assert!(matches!(err, StorageError::MultipleRows { count: 2, .. }));

        let scoped = QueryOptions::new().filter(OrgCondition::and([
            OrgCondition::Name("ACME".to_string()),
            OrgCondition::InstanceId("inst-2".to_string()),
        ]));
        assert_eq!(store.get(&scoped).await.unwrap().id, "300");

        let missing = QueryOptions::new().filter(OrgCondition::Id("999".to_string()));
        assert!(store.get(&missing).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_sorts_and_paginates() {
        let store = seeded();

        let options = QueryOptions::new()
            .order_by(OrgColumn::Id, SortOrder::Desc)
            .offset(1)
            .limit(1);
        let page = store.list(&options).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "200");
    }

    #[tokio::test]
    async fn update_applies_changes() {
        let store = seeded();
        let id = OrgIdentifier::Id("100".to_string());

        let affected = store
            .update(&id, "inst-1", &[OrgChange::SetState(OrgState::Inactive)])
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let org = store
            .get(&QueryOptions::new().filter(OrgCondition::and([
                id.clone().into(),
                OrgCondition::InstanceId("inst-1".to_string()),
            ])))
            .await
            .unwrap();
        assert_eq!(org.state, OrgState::Inactive);

        // wrong instance
        let affected = store
            .update(&id, "inst-2", &[OrgChange::SetName("Other".to_string())])
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let err = store
            .update(&id, "inst-1", &[OrgChange::SetName("Globex".to_string())])
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn delete_removes_memberships() {
        let store = seeded();
        store
            .add_member("100", "user-1", &["ORG_OWNER".to_string()])
            .await
            .unwrap();

        let affected = store
            .delete(&OrgIdentifier::Name("ACME".to_string()), "inst-1")
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(store.member_roles("100", "user-1").await.unwrap(), None);

        let affected = store
            .delete(&OrgIdentifier::Name("ACME".to_string()), "inst-1")
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn member_roles_lifecycle() {
        let store = seeded();

        store
            .add_member("100", "user-1", &["ORG_USER".to_string()])
            .await
            .unwrap();
        assert!(store
            .add_member("100", "user-1", &[])
            .await
            .unwrap_err()
            .is_duplicate());

        store
            .set_member_roles("100", "user-1", &["ORG_OWNER".to_string()])
            .await
            .unwrap();
        assert_eq!(
            store.member_roles("100", "user-1").await.unwrap(),
            Some(vec!["ORG_OWNER".to_string()])
        );

        store.remove_member("100", "user-1").await.unwrap();
        assert!(store
            .remove_member("100", "user-1")
            .await
            .unwrap_err()
            .is_not_found());

        assert!(store
            .add_member("999", "user-1", &[])
            .await
            .unwrap_err()
            .is_not_found());
    }
}
