//! Identity resolution from a validated assertion.
//!
//! Pure functions over an immutable [`Assertion`]: flatten the attribute
//! statements, then pick the subject identifier.
//!
//! Identifier precedence:
//!
//! 1. No subject or no NameID: the transient mapping attribute, when one is
//!    configured; otherwise the identity has no usable identifier.
//! 2. NameID with the transient format: always the transient mapping
//!    attribute, even though the NameID carries a value.
//! 3. Any other NameID: its literal value.

use idc_idp::{IdpError, IdpResult};
use idc_model::Attributes;

use crate::types::Assertion;

/// No `RequestID` or no inbound message on the session.
pub const CODE_REQUEST_MISSING: &str = "SAML-request-missing";

/// The protocol library rejected the response (replay, `InResponseTo`,
/// signature, conditions).
pub const CODE_RESPONSE_REJECTED: &str = "SAML-response-rejected";

/// The inbound message could not be decoded or parsed.
pub const CODE_RESPONSE_MALFORMED: &str = "SAML-response-malformed";

/// The protocol library failed for another reason.
pub const CODE_UPSTREAM: &str = "SAML-upstream-failure";

/// No NameID and no transient mapping configured.
pub const CODE_NAME_ID_MISSING: &str = "SAML-nameid-missing";

/// Transient NameID but no transient mapping configured.
pub const CODE_MAPPING_UNCONFIGURED: &str = "SAML-mapping-unconfigured";

/// The mapping attribute is present but not single-valued.
pub const CODE_MAPPING_AMBIGUOUS: &str = "SAML-mapping-ambiguous";

/// The mapping attribute is not present.
pub const CODE_MAPPING_ABSENT: &str = "SAML-mapping-absent";

/// The session was already used for a completion attempt.
pub const CODE_SESSION_CONSUMED: &str = "SAML-session-consumed";

/// Collects all attributes of all statements.
///
/// A name repeated in a later statement replaces the earlier values.
#[must_use]
pub fn flatten_attributes(assertion: &Assertion) -> Attributes {
    let mut attributes = Attributes::new();
    for attribute in assertion.attributes() {
        attributes.insert(attribute.name.clone(), attribute.values.clone());
    }
    attributes
}

/// Resolves the subject identifier.
///
/// `transient_mapping` is the configured mapping attribute name, if any.
/// An empty name counts as unconfigured.
pub fn resolve_name_id(assertion: &Assertion, transient_mapping: Option<&str>) -> IdpResult<String> {
    let transient_mapping = transient_mapping.filter(|name| !name.is_empty());
    match assertion.name_id() {
        None => {
            // ADFS omits the NameID unless a claim rule issues one
            let Some(mapping) = transient_mapping else {
                return Err(IdpError::missing_identifier(
                    CODE_NAME_ID_MISSING,
                    "assertion has no NameID and no transient mapping attribute is configured",
                ));
            };
            tracing::debug!(attribute = mapping, "no NameID, using transient mapping");
            transient_mapping_id(assertion, mapping)
        }
        Some(name_id) if name_id.is_transient() => {
            let Some(mapping) = transient_mapping else {
                return Err(IdpError::missing_identifier(
                    CODE_MAPPING_UNCONFIGURED,
                    "NameID is transient and no transient mapping attribute is configured",
                ));
            };
            tracing::debug!(attribute = mapping, "transient NameID, using transient mapping");
            transient_mapping_id(assertion, mapping)
        }
        Some(name_id) => Ok(name_id.value.clone()),
    }
}

/// Reads the identifier from the mapping attribute.
///
/// The first attribute with the given name decides: it must carry exactly
/// one value.
pub fn transient_mapping_id(assertion: &Assertion, attribute_name: &str) -> IdpResult<String> {
    let Some(attribute) = assertion.attributes().find(|a| a.name == attribute_name) else {
        return Err(IdpError::ambiguous_mapping(CODE_MAPPING_ABSENT, attribute_name, 0));
    };

    match attribute.values.as_slice() {
        [value] => Ok(value.clone()),
        values => Err(IdpError::ambiguous_mapping(
            CODE_MAPPING_AMBIGUOUS,
            attribute_name,
            values.len(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use idc_idp::ErrorKind;

    use super::*;
    use crate::types::{Attribute, AttributeStatement, NameId, Subject};

    const IDP: &str = "https://idp.example.com";

    fn with_attributes(assertion: Assertion, attributes: Vec<Attribute>) -> Assertion {
        let statement = attributes
            .into_iter()
            .fold(AttributeStatement::new(), AttributeStatement::with_attribute);
        assertion.with_attribute_statement(statement)
    }

    #[test]
    fn literal_name_id_wins() {
        let assertion = with_attributes(
            Assertion::new(IDP).with_subject(Subject::new(NameId::persistent("alice"))),
            vec![Attribute::single("employeeNumber", "4711")],
        );

        assert_eq!(resolve_name_id(&assertion, None).unwrap(), "alice");
        assert_eq!(
            resolve_name_id(&assertion, Some("employeeNumber")).unwrap(),
            "alice"
        );
    }

    #[test]
    fn transient_name_id_uses_mapping() {
        let assertion = with_attributes(
            Assertion::new(IDP).with_subject(Subject::new(NameId::transient("_a1b2c3"))),
            vec![Attribute::single("uid", "bob")],
        );

        assert_eq!(resolve_name_id(&assertion, Some("uid")).unwrap(), "bob");
    }

    #[test]
    fn transient_name_id_without_mapping() {
        let assertion =
            Assertion::new(IDP).with_subject(Subject::new(NameId::transient("_a1b2c3")));

        let err = resolve_name_id(&assertion, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
        assert_eq!(err.code(), CODE_MAPPING_UNCONFIGURED);
    }

    #[test]
    fn missing_name_id_without_mapping() {
        let assertion = with_attributes(
            Assertion::new(IDP),
            vec![Attribute::single("uid", "bob")],
        );

        let err = resolve_name_id(&assertion, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
        assert_eq!(err.code(), CODE_NAME_ID_MISSING);
    }

    #[test]
    fn empty_mapping_name_is_unconfigured() {
        let missing = with_attributes(Assertion::new(IDP), vec![Attribute::single("", "bob")]);
        let err = resolve_name_id(&missing, Some("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
        assert_eq!(err.code(), CODE_NAME_ID_MISSING);

        let transient =
            Assertion::new(IDP).with_subject(Subject::new(NameId::transient("_a1b2c3")));
        let err = resolve_name_id(&transient, Some("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
        assert_eq!(err.code(), CODE_MAPPING_UNCONFIGURED);
    }

    #[test]
    fn missing_name_id_with_mapping() {
        let assertion = with_attributes(
            Assertion::new(IDP).with_subject(Subject::default()),
            vec![Attribute::single("uid", "bob")],
        );

        assert_eq!(resolve_name_id(&assertion, Some("uid")).unwrap(), "bob");
    }

    #[test]
    fn mapping_with_several_values_is_ambiguous() {
        let assertion = with_attributes(
            Assertion::new(IDP),
            vec![Attribute::multi("uid", vec!["bob".to_string(), "robert".to_string()])],
        );

        let err = resolve_name_id(&assertion, Some("uid")).unwrap_err();
        assert!(matches!(
            err,
            IdpError::AmbiguousMapping { ref attribute, value_count: 2, .. } if attribute == "uid"
        ));
    }

    #[test]
    fn mapping_without_values_is_ambiguous() {
        let assertion = with_attributes(Assertion::new(IDP), vec![Attribute::multi("uid", vec![])]);

        let err = transient_mapping_id(&assertion, "uid").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousMapping);
        assert_eq!(err.code(), CODE_MAPPING_AMBIGUOUS);
    }

    #[test]
    fn absent_mapping_attribute() {
        let assertion = with_attributes(Assertion::new(IDP), vec![Attribute::single("mail", "x")]);

        let err = transient_mapping_id(&assertion, "uid").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousMapping);
        assert_eq!(err.code(), CODE_MAPPING_ABSENT);
    }

    #[test]
    fn first_mapping_attribute_decides() {
        let assertion = with_attributes(
            with_attributes(Assertion::new(IDP), vec![Attribute::single("uid", "first")]),
            vec![Attribute::multi("uid", vec!["a".to_string(), "b".to_string()])],
        );

        assert_eq!(transient_mapping_id(&assertion, "uid").unwrap(), "first");
    }

    #[test]
    fn later_statement_replaces_attribute() {
        let assertion = with_attributes(
            with_attributes(
                Assertion::new(IDP),
                vec![
                    Attribute::multi("groups", vec!["admins".to_string(), "users".to_string()]),
                    Attribute::single("mail", "alice@example.com"),
                ],
            ),
            vec![Attribute::single("groups", "auditors")],
        );

        let attributes = flatten_attributes(&assertion);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get("groups"), Some(&["auditors".to_string()][..]));
        assert_eq!(attributes.first("mail"), Some("alice@example.com"));
    }
}
