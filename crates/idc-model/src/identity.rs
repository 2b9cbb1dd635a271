//! Resolved identity model.
//!
//! A [`ResolvedIdentity`] is what a federated login hands to the token
//! issuance pipeline: the subject identifier the identity provider asserted
//! plus every attribute it sent along.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Attributes asserted about a subject.
///
/// Names map to ordered value lists. Inserting a name that already exists
/// replaces its values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(HashMap<String, Vec<String>>);

impl Attributes {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values of an attribute, replacing any previous values.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.0.insert(name.into(), values);
    }

    /// Sets the values of an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.insert(name, values);
        self
    }

    /// Gets all values of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns whether the attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of distinct attribute names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no attributes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over attribute names and values in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Consumes the map, returning the underlying storage.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, Vec<String>> {
        self.0
    }
}

impl From<HashMap<String, Vec<String>>> for Attributes {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// The identity resolved from an identity provider response.
///
/// The identifier is absent only when the identity is returned alongside an
/// identifier-resolution failure, so that failure handling can still inspect
/// the asserted attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    id: Option<String>,
    attributes: Attributes,
}

impl ResolvedIdentity {
    /// Creates a resolved identity.
    #[must_use]
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: Some(id.into()),
            attributes,
        }
    }

    /// Creates an identity that carries attributes but no identifier.
    #[must_use]
    pub const fn unidentified(attributes: Attributes) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the asserted attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns whether a subject identifier was resolved.
    #[must_use]
    pub const fn is_identified(&self) -> bool {
        self.id.is_some()
    }

    /// Splits the identity into identifier and attributes.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, Attributes) {
        (self.id, self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_values() {
        let mut attrs = Attributes::new();
        attrs.insert("groups", vec!["admins".to_string(), "users".to_string()]);
        attrs.insert("groups", vec!["auditors".to_string()]);

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("groups"), Some(&["auditors".to_string()][..]));
        assert_eq!(attrs.first("groups"), Some("auditors"));
        assert_eq!(attrs.first("missing"), None);
    }

    #[test]
    fn unidentified_identity_keeps_attributes() {
        let attrs = Attributes::new().with("mail", vec!["bob@example.com".to_string()]);
        let identity = ResolvedIdentity::unidentified(attrs);

        assert!(!identity.is_identified());
        assert_eq!(identity.id(), None);
        assert_eq!(identity.attributes().first("mail"), Some("bob@example.com"));
    }

    #[test]
    fn serializes_wire_shape() {
        let identity = ResolvedIdentity::new(
            "alice",
            Attributes::new().with("mail", vec!["alice@example.com".to_string()]),
        );

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "alice",
                "attributes": { "mail": ["alice@example.com"] }
            })
        );
    }
}
