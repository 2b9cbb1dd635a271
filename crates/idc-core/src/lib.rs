//! # idc-core
//!
//! Core utilities, configuration, and error handling for the identity
//! resolution core.
//!
//! This crate provides foundational types shared by the protocol crates:
//!
//! - [`config`] - Configuration for scope resolution and federated IdPs
//! - [`error`] - Top-level error type
//! - [`event`] - Audit events for federated login attempts and token claims

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::Config;
pub use error::{Error, Result};
