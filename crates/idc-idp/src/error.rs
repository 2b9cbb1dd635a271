//! Identity provider session errors.
//!
//! Errors carry a closed [`ErrorKind`], a stable diagnostic code, and a
//! localization key. Callers branch on the kind and render user-facing text
//! from the key; the code is an opaque value for logs and support.

use std::error::Error as StdError;

use idc_model::ResolvedIdentity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Localization key for rejected or missing responses.
pub const KEY_RESPONSE_INVALID: &str = "Errors.Intent.ResponseInvalid";

/// Localization key for responses without a usable subject.
pub const KEY_MISSING_NAME_ID: &str = "Errors.Intent.MissingNameID";

/// Localization key for a mapping attribute without exactly one value.
pub const KEY_MISSING_SINGLE_MAPPING_ATTRIBUTE: &str =
    "Errors.Intent.MissingSingleMappingAttribute";

/// Localization key for upstream protocol failures.
pub const KEY_UPSTREAM_FAILURE: &str = "Errors.Intent.IdPFailed";

/// Localization key for canceled requests.
pub const KEY_CANCELED: &str = "Errors.Intent.Canceled";

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Correlation data missing, or the response failed structural or replay validation.
    InvalidArgument,
    /// No usable subject and no fallback configured.
    MissingIdentifier,
    /// Mapping attribute absent or not single-valued.
    AmbiguousMapping,
    /// Any other failure reported by the protocol library.
    UpstreamProtocol,
    /// The surrounding request was canceled or ran out of time.
    Canceled,
}

impl ErrorKind {
    /// Returns the serialized name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MissingIdentifier => "MISSING_IDENTIFIER",
            Self::AmbiguousMapping => "AMBIGUOUS_MAPPING",
            Self::UpstreamProtocol => "UPSTREAM_PROTOCOL",
            Self::Canceled => "CANCELED",
        }
    }
}

/// Errors returned by identity provider sessions.
#[derive(Debug, Error)]
pub enum IdpError {
    /// Correlation data missing or response rejected.
    #[error("invalid argument [{code}]: {reason}")]
    InvalidArgument {
        /// Stable diagnostic code.
        code: &'static str,
        /// Localization key.
        message_key: &'static str,
        /// Human-readable diagnostic.
        reason: String,
        /// Underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// No usable subject identifier.
    #[error("missing identifier [{code}]: {reason}")]
    MissingIdentifier {
        /// Stable diagnostic code.
        code: &'static str,
        /// Localization key.
        message_key: &'static str,
        /// Human-readable diagnostic.
        reason: String,
    },

    /// Mapping attribute without exactly one value.
    #[error(
        "ambiguous mapping [{code}]: attribute '{attribute}' has {value_count} values, expected exactly one"
    )]
    AmbiguousMapping {
        /// Stable diagnostic code.
        code: &'static str,
        /// Localization key.
        message_key: &'static str,
        /// Name of the mapping attribute.
        attribute: String,
        /// Number of values found (zero when the attribute is absent).
        value_count: usize,
    },

    /// Failure reported by the protocol library.
    #[error("upstream protocol error [{code}]: {reason}")]
    UpstreamProtocol {
        /// Stable diagnostic code.
        code: &'static str,
        /// Localization key.
        message_key: &'static str,
        /// Human-readable diagnostic.
        reason: String,
        /// Underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// Request canceled or deadline exceeded.
    #[error("canceled [{code}]: {reason}")]
    Canceled {
        /// Stable diagnostic code.
        code: &'static str,
        /// Human-readable diagnostic.
        reason: String,
    },
}

impl IdpError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(code: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            code,
            message_key: KEY_RESPONSE_INVALID,
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates an invalid argument error wrapping an underlying error.
    #[must_use]
    pub fn invalid_argument_from(
        code: &'static str,
        reason: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::InvalidArgument {
            code,
            message_key: KEY_RESPONSE_INVALID,
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a missing identifier error.
    #[must_use]
    pub fn missing_identifier(code: &'static str, reason: impl Into<String>) -> Self {
        Self::MissingIdentifier {
            code,
            message_key: KEY_MISSING_NAME_ID,
            reason: reason.into(),
        }
    }

    /// Creates an ambiguous mapping error.
    #[must_use]
    pub fn ambiguous_mapping(
        code: &'static str,
        attribute: impl Into<String>,
        value_count: usize,
    ) -> Self {
        Self::AmbiguousMapping {
            code,
            message_key: KEY_MISSING_SINGLE_MAPPING_ATTRIBUTE,
            attribute: attribute.into(),
            value_count,
        }
    }

    /// Creates an upstream protocol error.
    #[must_use]
    pub fn upstream(
        code: &'static str,
        reason: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::UpstreamProtocol {
            code,
            message_key: KEY_UPSTREAM_FAILURE,
            reason: reason.into(),
            source,
        }
    }

    /// Creates a canceled error.
    #[must_use]
    pub fn canceled(code: &'static str, reason: impl Into<String>) -> Self {
        Self::Canceled {
            code,
            reason: reason.into(),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::MissingIdentifier { .. } => ErrorKind::MissingIdentifier,
            Self::AmbiguousMapping { .. } => ErrorKind::AmbiguousMapping,
            Self::UpstreamProtocol { .. } => ErrorKind::UpstreamProtocol,
            Self::Canceled { .. } => ErrorKind::Canceled,
        }
    }

    /// Returns the stable diagnostic code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { code, .. }
            | Self::MissingIdentifier { code, .. }
            | Self::AmbiguousMapping { code, .. }
            | Self::UpstreamProtocol { code, .. }
            | Self::Canceled { code, .. } => *code,
        }
    }

    /// Returns the localization key for user-facing messages.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidArgument { message_key, .. }
            | Self::MissingIdentifier { message_key, .. }
            | Self::AmbiguousMapping { message_key, .. }
            | Self::UpstreamProtocol { message_key, .. } => *message_key,
            Self::Canceled { .. } => KEY_CANCELED,
        }
    }

    /// Checks if the subject identifier could not be resolved.
    #[must_use]
    pub const fn is_identifier_error(&self) -> bool {
        matches!(
            self,
            Self::MissingIdentifier { .. } | Self::AmbiguousMapping { .. }
        )
    }
}

/// Result type for identity provider session operations.
pub type IdpResult<T> = Result<T, IdpError>;

/// Failure of a user fetch.
///
/// When only the subject identifier could not be resolved, the identity
/// carrying the asserted attributes is attached so failure handling can
/// still inspect them.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct FetchUserError {
    error: IdpError,
    user: Option<ResolvedIdentity>,
}

impl FetchUserError {
    /// Creates a failure without identity.
    #[must_use]
    pub const fn new(error: IdpError) -> Self {
        Self { error, user: None }
    }

    /// Creates a failure carrying the partially resolved identity.
    #[must_use]
    pub const fn with_user(error: IdpError, user: ResolvedIdentity) -> Self {
        Self {
            error,
            user: Some(user),
        }
    }

    /// Returns the underlying error.
    #[must_use]
    pub const fn error(&self) -> &IdpError {
        &self.error
    }

    /// Returns the partially resolved identity, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&ResolvedIdentity> {
        self.user.as_ref()
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Splits the failure into error and identity.
    #[must_use]
    pub fn into_parts(self) -> (IdpError, Option<ResolvedIdentity>) {
        (self.error, self.user)
    }
}

impl From<IdpError> for FetchUserError {
    fn from(error: IdpError) -> Self {
        Self::new(error)
    }
}
