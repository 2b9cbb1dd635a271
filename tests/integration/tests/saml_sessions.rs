//! Federated login through SAML sessions.
//!
//! Each test drives a full attempt: initiation, the IdP answering the
//! request, and completion of a session rebuilt for the callback.

use std::time::Duration;

use idc_idp::{AuthAction, ErrorKind, IdpSession, RequestContext, SessionState};
use idc_protocol_saml::bindings::HttpRedirectBinding;
use idc_protocol_saml::resolve::{
    CODE_MAPPING_ABSENT, CODE_MAPPING_AMBIGUOUS, CODE_MAPPING_UNCONFIGURED, CODE_NAME_ID_MISSING,
    CODE_REQUEST_MISSING, CODE_RESPONSE_MALFORMED, CODE_RESPONSE_REJECTED,
};
use idc_protocol_saml::{Attribute, AuthnRequest, InboundMessage, NameId, SamlBinding};

use crate::common::{assertion, provider};

#[tokio::test]
async fn test_redirect_login_resolves_persistent_name_id() -> anyhow::Result<()> {
    let (provider, idp) = provider("adfs")?;
    let ctx = RequestContext::new();

    let mut session = provider.new_session("id-6b1f0c", None);
    let action = session.initiate_auth(&ctx).await?;
    let url = action
        .redirect_url()
        .ok_or_else(|| anyhow::anyhow!("expected redirect, got {action:?}"))?;
    assert!(url.starts_with("https://adfs.example.com/adfs/ls?SAMLRequest="));

    let request = HttpRedirectBinding::decode_url(url)?;
    let (request_id, issuer) = AuthnRequest::parse_id_and_issuer(&request.xml)?;
    assert_eq!(request_id, "id-6b1f0c");
    assert_eq!(issuer.as_deref(), Some("https://auth.example.com/saml/metadata"));
    assert!(request.xml.contains("nameid-format:persistent"));

    // callback is handled by a fresh session for the persisted request ID
    let message = idp.respond(
        &request_id,
        assertion(
            Some(NameId::persistent("alice")),
            vec![Attribute::single("mail", "alice@example.com")],
        ),
    );
    let mut callback = provider.new_session(request_id, Some(message));
    let user = callback.fetch_user(&ctx).await?;

    assert_eq!(user.id(), Some("alice"));
    assert_eq!(user.attributes().first("mail"), Some("alice@example.com"));
    assert_eq!(callback.state(), SessionState::Resolved);
    Ok(())
}

#[tokio::test]
async fn test_post_login_uses_transient_mapping() -> anyhow::Result<()> {
    let (provider, idp) = provider("okta")?;
    let ctx = RequestContext::new();

    let mut session = provider.new_session("id-a1", None);
    let AuthAction::Form(html) = session.initiate_auth(&ctx).await? else {
        anyhow::bail!("expected form for POST binding");
    };
    assert!(html.contains(r#"action="https://example.okta.com/app/sso/saml""#));
    assert_eq!(session.state(), SessionState::AwaitingResponse);

    session.set_inbound_message(idp.respond(
        "id-a1",
        assertion(
            Some(NameId::transient("_9c2e74d1")),
            vec![
                Attribute::single("employeeNumber", "bob"),
                Attribute::multi("groups", vec!["eng".to_string(), "ops".to_string()]),
            ],
        ),
    ));
    let user = session.fetch_user(&ctx).await?;

    assert_eq!(user.id(), Some("bob"));
    assert_eq!(user.attributes().get("groups").map(<[String]>::len), Some(2));
    assert!(session.assertion().is_some());
    Ok(())
}

#[tokio::test]
async fn test_missing_request_id_or_message() -> anyhow::Result<()> {
    let (provider, idp) = provider("okta")?;
    let ctx = RequestContext::new();
    let message = idp.respond("id-1", assertion(Some(NameId::new("alice")), vec![]));

    for mut session in [
        provider.new_session("", Some(message)),
        provider.new_session("id-1", None),
    ] {
        let err = session.fetch_user(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.error().code(), CODE_REQUEST_MISSING);
        assert!(err.user().is_none());
    }
    Ok(())
}

#[tokio::test]
async fn test_literal_name_id_ignores_mapping() -> anyhow::Result<()> {
    let (provider, idp) = provider("okta")?;
    let message = idp.respond(
        "id-1",
        assertion(
            Some(NameId::new("alice")),
            vec![Attribute::single("employeeNumber", "4711")],
        ),
    );

    let user = provider
        .new_session("id-1", Some(message))
        .fetch_user(&RequestContext::new())
        .await?;
    assert_eq!(user.id(), Some("alice"));
    Ok(())
}

#[tokio::test]
async fn test_identifier_failures_carry_partial_identity() -> anyhow::Result<()> {
    let ctx = RequestContext::new();

    // adfs has no transient mapping configured
    let (adfs, adfs_idp) = provider("adfs")?;
    let cases = [
        (None, CODE_NAME_ID_MISSING),
        (Some(NameId::transient("_t1")), CODE_MAPPING_UNCONFIGURED),
    ];
    for (name_id, code) in cases {
        let message = adfs_idp.respond(
            "id-1",
            assertion(name_id, vec![Attribute::single("mail", "carol@example.com")]),
        );
        let err = adfs.new_session("id-1", Some(message)).fetch_user(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
        assert_eq!(err.error().code(), code);

        let user = err.user().expect("partial identity");
        assert_eq!(user.id(), None);
        assert_eq!(user.attributes().first("mail"), Some("carol@example.com"));
    }

    let (okta, okta_idp) = provider("okta")?;
    let message = okta_idp.respond(
        "id-2",
        assertion(
            Some(NameId::transient("_t2")),
            vec![Attribute::multi(
                "employeeNumber",
                vec!["17".to_string(), "18".to_string()],
            )],
        ),
    );
    let err = okta.new_session("id-2", Some(message)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousMapping);
    assert_eq!(err.error().code(), CODE_MAPPING_AMBIGUOUS);
    assert!(err.error().to_string().contains("employeeNumber"));
    assert!(err.user().is_some_and(|u| u.attributes().contains("employeeNumber")));

    let message = okta_idp.respond(
        "id-3",
        assertion(None, vec![Attribute::single("mail", "dave@example.com")]),
    );
    let err = okta.new_session("id-3", Some(message)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousMapping);
    assert_eq!(err.error().code(), CODE_MAPPING_ABSENT);
    assert!(err.user().is_some());
    Ok(())
}

#[tokio::test]
async fn test_rejected_responses() -> anyhow::Result<()> {
    let (provider, idp) = provider("okta")?;
    let ctx = RequestContext::new();

    // answer to another request
    let message = idp.respond("id-other", assertion(Some(NameId::new("alice")), vec![]));
    let err = provider.new_session("id-1", Some(message)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.error().code(), CODE_RESPONSE_REJECTED);
    assert!(err.user().is_none());

    // replay into a new session
    let message = idp.respond("id-2", assertion(Some(NameId::new("alice")), vec![]));
    provider.new_session("id-2", Some(message.clone())).fetch_user(&ctx).await?;
    let err = provider.new_session("id-2", Some(message)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.error().code(), CODE_RESPONSE_REJECTED);

    // not base64
    let garbage = InboundMessage::new(SamlBinding::HttpPost, "%%%not-base64%%%");
    let err = provider.new_session("id-3", Some(garbage)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.error().code(), CODE_RESPONSE_MALFORMED);
    Ok(())
}

#[tokio::test]
async fn test_failed_session_is_terminal() -> anyhow::Result<()> {
    let (provider, idp) = provider("okta")?;
    let ctx = RequestContext::new();

    let stale = idp.respond("id-other", assertion(Some(NameId::new("alice")), vec![]));
    let mut session = provider.new_session("id-1", Some(stale));
    assert!(session.fetch_user(&ctx).await.is_err());
    assert_eq!(session.state(), SessionState::Failed);

    // a valid response does not revive the session
    session.set_inbound_message(idp.respond("id-1", assertion(Some(NameId::new("alice")), vec![])));
    let err = session.fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(session.state(), SessionState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_cancellation_and_deadline() -> anyhow::Result<()> {
    let (provider, idp) = provider("okta")?;
    idp.set_delay(Duration::from_secs(60));

    let ctx = RequestContext::new();
    let canceler = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceler.cancel();
    });
    let message = idp.respond("id-1", assertion(Some(NameId::new("alice")), vec![]));
    let err = provider.new_session("id-1", Some(message)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Canceled);

    let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
    let message = idp.respond("id-2", assertion(Some(NameId::new("alice")), vec![]));
    let err = provider.new_session("id-2", Some(message)).fetch_user(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Canceled);
    assert!(err.user().is_none());
    Ok(())
}
