//! Common test utilities and fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use parking_lot::Mutex;
use quick_xml::events::Event;
use quick_xml::Reader;

use idc_core::config::Config;
use idc_protocol_saml::bindings::PARAM_SAML_RESPONSE;
use idc_protocol_saml::{
    Assertion, Attribute, AttributeStatement, InboundMessage, NameId, SamlError, SamlProvider,
    SamlResult, ServiceProvider, ServiceProviderConfig, Subject,
};

/// Two IdP connections and an instance project.
pub const CONFIG: &str = r#"
[scope]
instance_project_id = "240254349557465394"

[[saml]]
name = "okta"
sp_entity_id = "https://auth.example.com/saml/metadata"
acs_url = "https://auth.example.com/saml/acs"
idp_sso_url = "https://example.okta.com/app/sso/saml"
binding = "post"
transient_mapping_attribute_name = "employeeNumber"

[[saml]]
name = "adfs"
sp_entity_id = "https://auth.example.com/saml/metadata"
acs_url = "https://auth.example.com/saml/acs"
idp_sso_url = "https://adfs.example.com/adfs/ls"
name_id_format = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent"
response_timeout = 5
"#;

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("idc_protocol_saml=debug,idc_protocol_oidc=debug,audit=info")
        .with_test_writer()
        .try_init();
}

/// Loads and validates the fixture configuration.
pub fn config() -> anyhow::Result<Config> {
    init_tracing();
    let config = Config::from_toml_str(CONFIG)?;
    config.validate()?;
    Ok(config)
}

/// Builds the provider `name` from the fixture configuration.
pub fn provider(name: &str) -> anyhow::Result<(SamlProvider, Arc<FakeIdp>)> {
    let config = config()?;
    let idp_config = config
        .saml_idp(name)
        .ok_or_else(|| anyhow::anyhow!("no IdP named {name}"))?;

    let idp = Arc::new(FakeIdp::new(ServiceProviderConfig::from_idp_config(idp_config)?));
    let provider = SamlProvider::from_idp_config(idp_config, idp.clone());
    Ok((provider, idp))
}

/// An assertion with the given NameID and one attribute statement.
pub fn assertion(name_id: Option<NameId>, attributes: Vec<Attribute>) -> Assertion {
    let statement = attributes
        .into_iter()
        .fold(AttributeStatement::new(), AttributeStatement::with_attribute);
    let assertion = Assertion::new("https://example.okta.com").with_attribute_statement(statement);
    match name_id {
        Some(name_id) => assertion.with_subject(Subject::new(name_id)),
        None => assertion,
    }
}

// ============================================================================
// Fake identity provider
// ============================================================================

/// Stands in for both the remote IdP and the protocol library.
///
/// [`FakeIdp::respond`] issues a POST-bound response for a request ID.
/// Parsing decodes the message, checks `InResponseTo` and rejects replays.
pub struct FakeIdp {
    config: ServiceProviderConfig,
    issued: Mutex<HashMap<String, Assertion>>,
    consumed: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl FakeIdp {
    /// Creates an IdP without issued responses.
    pub fn new(config: ServiceProviderConfig) -> Self {
        Self {
            config,
            issued: Mutex::new(HashMap::new()),
            consumed: Mutex::new(HashSet::new()),
            next_id: AtomicUsize::new(1),
            delay: Mutex::new(None),
        }
    }

    /// Delays every parse by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Issues a response answering `in_response_to`.
    pub fn respond(&self, in_response_to: &str, assertion: Assertion) -> InboundMessage {
        let response_id = format!("_resp{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let xml = format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="{response_id}" InResponseTo="{in_response_to}" Version="2.0"/>"#
        );
        self.issued.lock().insert(response_id, assertion);

        let form = HashMap::from([(
            PARAM_SAML_RESPONSE.to_string(),
            base64::engine::general_purpose::STANDARD.encode(xml),
        )]);
        InboundMessage::from_post_form(&form).expect("form carries SAMLResponse")
    }
}

#[async_trait]
impl ServiceProvider for FakeIdp {
    fn config(&self) -> &ServiceProviderConfig {
        &self.config
    }

    async fn parse_response(
        &self,
        message: &InboundMessage,
        possible_request_ids: &[String],
    ) -> SamlResult<Assertion> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let decoded = message.decode()?;
        let (response_id, in_response_to) = response_ids(&decoded.xml)?;

        if !possible_request_ids.contains(&in_response_to) {
            return Err(SamlError::InvalidResponse(format!(
                "InResponseTo '{in_response_to}' does not match"
            )));
        }
        if !self.consumed.lock().insert(response_id.clone()) {
            return Err(SamlError::InvalidResponse(format!(
                "response '{response_id}' already consumed"
            )));
        }
        self.issued
            .lock()
            .get(&response_id)
            .cloned()
            .ok_or_else(|| SamlError::InvalidResponse(format!("unknown response '{response_id}'")))
    }
}

fn response_ids(xml: &str) -> SamlResult<(String, String)> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Response" => {
                let mut id = None;
                let mut in_response_to = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| SamlError::XmlParse(err.to_string()))?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.as_ref() {
                        b"ID" => id = Some(value),
                        b"InResponseTo" => in_response_to = Some(value),
                        _ => {}
                    }
                }
                return id.zip(in_response_to).ok_or_else(|| {
                    SamlError::MissingElement("Response/@ID or @InResponseTo".to_string())
                });
            }
            Event::Eof => return Err(SamlError::MissingElement("Response".to_string())),
            _ => {}
        }
    }
}
