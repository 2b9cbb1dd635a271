//! # idc-model
//!
//! Domain models shared by the identity resolution engines and the token
//! issuance pipeline.
//!
//! - [`ResolvedIdentity`] - The subject resolved from a federated login
//! - [`Attributes`] - Multi-valued attributes asserted by an identity provider
//! - [`Organization`] - Organizations referenced by role scopes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod identity;
pub mod organization;

pub use identity::{Attributes, ResolvedIdentity};
pub use organization::{CreateOrganization, OrgState, Organization, OrganizationDomain};
