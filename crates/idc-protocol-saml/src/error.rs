//! SAML error types.
//!
//! Errors raised by the bindings, by message encoding, and by the
//! [`ServiceProvider`](crate::ServiceProvider) collaborator while parsing a
//! response.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid SAML request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response was rejected: wrong `InResponseTo`, expired, replayed,
    /// wrong audience or destination.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlParse(String),

    /// XML signature validation failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Unknown or unsupported binding.
    #[error("unsupported binding: {0}")]
    UnsupportedBinding(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// Internal error of the protocol library.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SamlError {
    /// Returns whether the response was well-formed but rejected by
    /// validation (replay, audience, signature, `InResponseTo`).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidResponse(_) | Self::SignatureInvalid(_))
    }

    /// Returns whether the inbound message could not be decoded or parsed.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::XmlParse(_)
                | Self::MissingElement(_)
                | Self::Base64Decode(_)
                | Self::Deflate(_)
        )
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}
