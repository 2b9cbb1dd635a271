//! # idc-storage
//!
//! Storage abstraction traits for organization data.
//!
//! Entities are addressed through typed column, condition, and change
//! descriptors so that a relational backend can translate them into queries
//! while the in-memory backend evaluates them directly.
//!
//! ## Provider Traits
//!
//! - [`OrganizationProvider`] - Get/List/Create/Update/Delete for organizations
//! - [`MemberProvider`] - Organization membership and member roles
//!
//! ## Backends
//!
//! - [`MemoryOrganizationStore`] - Process-local store for tests and development

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod organization;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryOrganizationStore;
pub use organization::{
    MemberProvider, OrgChange, OrgColumn, OrgCondition, OrgIdentifier, OrganizationProvider,
    QueryOptions, SortOrder,
};
