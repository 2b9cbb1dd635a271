//! Configuration management.
//!
//! Configuration is loaded from a TOML file and then overridden from
//! environment variables (a `.env` file is honoured if present).

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding [`ScopeConfig::instance_project_id`].
pub const ENV_INSTANCE_PROJECT_ID: &str = "IDC_INSTANCE_PROJECT_ID";

/// Environment variable overriding [`ScopeConfig::reserved_project_alias`].
pub const ENV_RESERVED_PROJECT_ALIAS: &str = "IDC_RESERVED_PROJECT_ALIAS";

/// Default alias that refers to the instance's own project in audience scopes.
pub const DEFAULT_RESERVED_PROJECT_ALIAS: &str = "zitadel";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scope resolution configuration.
    #[serde(default)]
    pub scope: ScopeConfig,

    /// Configured SAML identity providers.
    #[serde(default)]
    pub saml: Vec<SamlIdpConfig>,
}

/// Scope resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Project ID of the instance itself, substituted for the reserved alias.
    #[serde(default)]
    pub instance_project_id: Option<String>,

    /// Project alias that resolves to [`Self::instance_project_id`].
    #[serde(default = "default_reserved_project_alias")]
    pub reserved_project_alias: String,
}

fn default_reserved_project_alias() -> String {
    DEFAULT_RESERVED_PROJECT_ALIAS.to_string()
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            instance_project_id: None,
            reserved_project_alias: default_reserved_project_alias(),
        }
    }
}

/// HTTP binding the identity provider expects for authentication requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdpBinding {
    /// HTTP-Redirect binding (query string, 302).
    #[default]
    Redirect,
    /// HTTP-POST binding (self-submitting form).
    Post,
}

/// Configuration of one SAML identity provider connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamlIdpConfig {
    /// Unique name of the identity provider connection.
    pub name: String,

    /// Entity ID of this service provider.
    pub sp_entity_id: String,

    /// Assertion consumer service URL the IdP posts responses to.
    pub acs_url: String,

    /// Single sign-on URL of the identity provider.
    pub idp_sso_url: String,

    /// Binding used to send the authentication request.
    #[serde(default)]
    pub binding: IdpBinding,

    /// NameID format requested from the IdP.
    #[serde(default)]
    pub name_id_format: Option<String>,

    /// Attribute used as the subject when the IdP sends a transient
    /// or no NameID.
    #[serde(default)]
    pub transient_mapping_attribute_name: Option<String>,

    /// Upper bound for validating a response, in seconds. Unset means the
    /// caller's own deadline applies.
    #[serde(default, with = "optional_secs")]
    pub response_timeout: Option<Duration>,
}

impl Config {
    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Loads configuration from a TOML file and applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;

        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        config.apply_env();
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            identity_providers = config.saml.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Applies overrides using the given variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project_id) = lookup(ENV_INSTANCE_PROJECT_ID).filter(|v| !v.is_empty()) {
            self.scope.instance_project_id = Some(project_id);
        }
        if let Some(alias) = lookup(ENV_RESERVED_PROJECT_ALIAS).filter(|v| !v.is_empty()) {
            self.scope.reserved_project_alias = alias;
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.scope.reserved_project_alias.is_empty() {
            return Err(Error::validation("reserved project alias must not be empty"));
        }

        let mut names = HashSet::new();
        for idp in &self.saml {
            if idp.name.is_empty() {
                return Err(Error::validation("identity provider name must not be empty"));
            }
            if !names.insert(idp.name.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate identity provider '{}'",
                    idp.name
                )));
            }
            if idp.sp_entity_id.is_empty() {
                return Err(Error::validation(format!(
                    "identity provider '{}': sp_entity_id must not be empty",
                    idp.name
                )));
            }
            for (field, value) in [("acs_url", &idp.acs_url), ("idp_sso_url", &idp.idp_sso_url)] {
                if !is_absolute_http_url(value) {
                    return Err(Error::validation(format!(
                        "identity provider '{}': {field} must be an absolute http(s) URL",
                        idp.name
                    )));
                }
            }
            if idp
                .transient_mapping_attribute_name
                .as_deref()
                .is_some_and(str::is_empty)
            {
                return Err(Error::validation(format!(
                    "identity provider '{}': transient_mapping_attribute_name must not be empty",
                    idp.name
                )));
            }
        }
        Ok(())
    }

    /// Looks up a SAML identity provider by name.
    #[must_use]
    pub fn saml_idp(&self, name: &str) -> Option<&SamlIdpConfig> {
        self.saml.iter().find(|idp| idp.name == name)
    }
}

/// Serde support for optional durations given in whole seconds.
mod optional_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

fn is_absolute_http_url(value: &str) -> bool {
    ["https://", "http://"].iter().any(|scheme| {
        value
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
    })
}
