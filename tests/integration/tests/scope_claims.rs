//! Token scope resolution against configuration and the organization store.

use std::sync::Arc;

use idc_model::{OrgState, Organization};
use idc_protocol_oidc::{
    resolve_scope_claims, Audience, AudienceContext, RoleOrganizationResolver, AUDIENCE_SUFFIX,
    PROJECT_AUDIENCE_PREFIX, ROLE_ORGANIZATION_PREFIX,
};
use idc_storage::{MemoryOrganizationStore, OrgChange, OrgIdentifier, OrganizationProvider};

use crate::common::config;

fn project_aud(id: &str) -> String {
    format!("{PROJECT_AUDIENCE_PREFIX}{id}{AUDIENCE_SUFFIX}")
}

fn role_org(id: &str) -> String {
    format!("{ROLE_ORGANIZATION_PREFIX}{id}")
}

#[tokio::test]
async fn test_token_request_claims() -> anyhow::Result<()> {
    let config = config()?;
    let ctx = AudienceContext::from_config(&config.scope);

    let store = Arc::new(MemoryOrganizationStore::new());
    store.create(&Organization::new("inst-1", "100", "ACME")).await?;
    store.create(&Organization::new("inst-1", "200", "Globex")).await?;
    store
        .update(
            &OrgIdentifier::Id("200".to_string()),
            "inst-1",
            &[OrgChange::SetState(OrgState::Inactive)],
        )
        .await?;

    let scopes = vec![
        "openid".to_string(),
        "profile".to_string(),
        project_aud("zitadel"),
        project_aud("crm"),
        role_org("200"),
        role_org("100"),
        role_org("404"),
    ];
    let claims = resolve_scope_claims(&["web-client".to_string()], &scopes, &ctx);

    assert_eq!(claims.audience, vec!["web-client", "240254349557465394", "crm"]);
    assert_eq!(claims.role_org_ids, vec!["200", "100", "404"]);
    assert_eq!(claims.aud(), Some(Audience::Multiple(claims.audience.clone())));
    claims.event("web-client").emit();

    let resolver = RoleOrganizationResolver::new(store);
    let orgs = resolver.resolve("inst-1", &claims.role_org_ids).await?;
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].name, "ACME");
    Ok(())
}

#[tokio::test]
async fn test_client_audience_narrows_token() -> anyhow::Result<()> {
    let config = config()?;
    let ctx = AudienceContext::from_config(&config.scope);

    let scopes = vec![
        project_aud("crm"),
        format!("mobile{AUDIENCE_SUFFIX}"),
        role_org("100"),
    ];
    let claims = resolve_scope_claims(&["web-client".to_string()], &scopes, &ctx);

    assert_eq!(claims.audience, vec!["mobile"]);
    assert_eq!(claims.aud(), Some(Audience::Single("mobile".to_string())));
    assert_eq!(claims.role_org_ids, vec!["100"]);
    Ok(())
}
