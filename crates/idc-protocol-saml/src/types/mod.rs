//! SAML 2.0 types used by the service provider side of a login.

mod assertion;
mod authn_request;
mod constants;
mod name_id;

pub use assertion::*;
pub use authn_request::*;
pub use constants::*;
pub use name_id::*;
