//! # idc-protocol-oidc
//!
//! Token scope resolution for OAuth 2.0 / `OpenID` Connect token issuance.
//!
//! Requested scopes decide two things about the token about to be minted:
//! its audience, and the organizations whose role claims it carries.
//! Resolution is pure and raises no errors; unrecognized scopes are ignored.
//!
//! ## Modules
//!
//! - [`scope`] - Scope grammar and audience computation
//! - [`claims`] - `aud` claim type and resolved scope claims
//! - [`roles`] - Role-organization lookup against the organization repository

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod roles;
pub mod scope;

pub use claims::{resolve_scope_claims, Audience, ScopeClaims};
pub use roles::RoleOrganizationResolver;
pub use scope::{
    compute_audience, role_org_ids_from_scopes, AudienceContext, ScopePattern, AUDIENCE_SUFFIX,
    PROJECT_AUDIENCE_PREFIX, ROLE_ORGANIZATION_PREFIX,
};
