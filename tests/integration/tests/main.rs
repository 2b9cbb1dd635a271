//! End-to-End Integration Tests
//!
//! These tests compose the crates the way a login and token handler would:
//! configuration, SAML sessions against a fake IdP, scope resolution, and
//! the in-memory organization store.

mod common;
mod saml_sessions;
mod scope_claims;
