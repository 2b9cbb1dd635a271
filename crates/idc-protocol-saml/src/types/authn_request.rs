//! SAML AuthnRequest.
//!
//! Authentication request message sent by this service provider to the
//! identity provider.

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use super::{NameIdPolicy, SamlBinding, SAMLP_NS, SAML_NS};
use crate::error::{SamlError, SamlResult};

/// SAML Authentication Request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique identifier; echoed back by the IdP as `InResponseTo`.
    pub id: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the service provider issuing the request.
    pub issuer: String,

    /// The URL where the response should be sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_consumer_service_url: Option<String>,

    /// The IdP endpoint this request is sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Binding the IdP must use for the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_binding: Option<String>,

    /// Name ID policy constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_policy: Option<NameIdPolicy>,

    /// Whether the IdP must authenticate the user directly.
    #[serde(default)]
    pub force_authn: bool,
}

impl AuthnRequest {
    /// Creates a request with the given ID.
    #[must_use]
    pub fn new(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            assertion_consumer_service_url: None,
            destination: None,
            protocol_binding: None,
            name_id_policy: None,
            force_authn: false,
        }
    }

    /// Sets the assertion consumer service URL.
    #[must_use]
    pub fn with_acs_url(mut self, url: impl Into<String>) -> Self {
        self.assertion_consumer_service_url = Some(url.into());
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Sets the protocol binding for the response.
    #[must_use]
    pub fn with_binding(mut self, binding: SamlBinding) -> Self {
        self.protocol_binding = Some(binding.uri().to_string());
        self
    }

    /// Sets the name ID policy.
    #[must_use]
    pub fn with_name_id_policy(mut self, policy: NameIdPolicy) -> Self {
        self.name_id_policy = Some(policy);
        self
    }

    /// Sets force authentication.
    #[must_use]
    pub const fn force_authn(mut self, force: bool) -> Self {
        self.force_authn = force;
        self
    }

    /// Validates the basic structure of this request.
    pub fn validate(&self) -> SamlResult<()> {
        if self.id.is_empty() {
            return Err(SamlError::InvalidRequest("ID is required".to_string()));
        }
        // xs:ID must not start with a digit
        if self.id.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(SamlError::InvalidRequest(format!(
                "ID '{}' must not start with a digit",
                self.id
            )));
        }
        if self.issuer.is_empty() {
            return Err(SamlError::InvalidRequest("Issuer is required".to_string()));
        }
        Ok(())
    }

    /// Serializes the request to XML.
    pub fn to_xml(&self) -> SamlResult<String> {
        self.validate()?;

        let issue_instant = self
            .issue_instant
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let force_authn = if self.force_authn { "true" } else { "false" };

        let mut root = BytesStart::new("samlp:AuthnRequest");
        root.push_attribute(("xmlns:samlp", SAMLP_NS));
        root.push_attribute(("xmlns:saml", SAML_NS));
        root.push_attribute(("ID", self.id.as_str()));
        root.push_attribute(("Version", "2.0"));
        root.push_attribute(("IssueInstant", issue_instant.as_str()));
        if let Some(ref destination) = self.destination {
            root.push_attribute(("Destination", destination.as_str()));
        }
        if let Some(ref acs_url) = self.assertion_consumer_service_url {
            root.push_attribute(("AssertionConsumerServiceURL", acs_url.as_str()));
        }
        if let Some(ref binding) = self.protocol_binding {
            root.push_attribute(("ProtocolBinding", binding.as_str()));
        }
        root.push_attribute(("ForceAuthn", force_authn));

        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        writer.write_event(Event::Start(root)).map_err(xml_error)?;

        writer
            .write_event(Event::Start(BytesStart::new("saml:Issuer")))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(&self.issuer)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("saml:Issuer")))
            .map_err(xml_error)?;

        if let Some(ref policy) = self.name_id_policy {
            let mut element = BytesStart::new("samlp:NameIDPolicy");
            if let Some(ref format) = policy.format {
                element.push_attribute(("Format", format.as_str()));
            }
            element.push_attribute(("AllowCreate", if policy.allow_create { "true" } else { "false" }));
            writer.write_event(Event::Empty(element)).map_err(xml_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("samlp:AuthnRequest")))
            .map_err(xml_error)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| SamlError::XmlParse(format!("invalid UTF-8 in generated request: {e}")))
    }

    /// Reads the `ID` and `Issuer` back from an AuthnRequest document.
    pub fn parse_id_and_issuer(xml: &str) -> SamlResult<(String, Option<String>)> {
        let mut reader = Reader::from_str(xml);
        let mut id = None;
        let mut issuer = None;
        let mut in_issuer = false;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"AuthnRequest" => {
                        for attr in e.attributes() {
                            let attr = attr.map_err(xml_error)?;
                            if attr.key.as_ref() == b"ID" {
                                id = Some(attr.unescape_value().map_err(xml_error)?.into_owned());
                            }
                        }
                    }
                    b"Issuer" => in_issuer = true,
                    _ => {}
                },
                Event::Text(text) if in_issuer => {
                    issuer = Some(text.unescape().map_err(xml_error)?.into_owned());
                }
                Event::End(e) if e.local_name().as_ref() == b"Issuer" => in_issuer = false,
                Event::Eof => break,
                _ => {}
            }
        }

        let id = id.ok_or_else(|| SamlError::MissingElement("AuthnRequest/@ID".to_string()))?;
        Ok((id, issuer))
    }
}

fn xml_error(err: impl Display) -> SamlError {
    SamlError::XmlParse(err.to_string())
}
