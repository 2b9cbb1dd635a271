//! Authentication initiation results.
//!
//! Protocol libraries usually "write" the start of an authentication flow to
//! an HTTP response. [`ResponseCapture`] is the value sink they write into;
//! [`AuthAction`] is what the caller's HTTP layer must then do.

use http::header::{HeaderName, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

/// What the browser must be sent to start authentication at the IdP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AuthAction {
    /// Redirect the browser to this URL.
    Redirect(String),
    /// Render this self-submitting HTML form.
    Form(String),
}

impl AuthAction {
    /// Returns the redirect URL, if this is a redirect.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Redirect(url) => Some(url),
            Self::Form(_) => None,
        }
    }

    /// Returns the form body, if this is a form.
    #[must_use]
    pub fn form_body(&self) -> Option<&str> {
        match self {
            Self::Form(body) => Some(body),
            Self::Redirect(_) => None,
        }
    }
}

/// In-memory HTTP response sink.
///
/// Holds only what was written to it: a status, headers, and body bytes.
#[derive(Debug, Clone, Default)]
pub struct ResponseCapture {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Sets a header, replacing previous values.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Appends bytes to the body.
    pub fn write(&mut self, content: &[u8]) {
        self.body.extend_from_slice(content);
    }

    /// Returns the recorded status code.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the captured headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the captured body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the `Location` header if it is set and not empty.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .filter(|location| !location.is_empty())
    }

    /// Converts the capture into an action.
    ///
    /// A non-empty `Location` header wins; otherwise the body is the form.
    #[must_use]
    pub fn into_action(self) -> AuthAction {
        if let Some(location) = self.location() {
            return AuthAction::Redirect(location.to_string());
        }
        AuthAction::Form(String::from_utf8_lossy(&self.body).into_owned())
    }
}
