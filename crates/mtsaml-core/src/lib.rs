//! # mtsaml-core
//!
//! Option model and shared types for multi-tenant SAML strategies.
//!
//! This crate provides the configuration values every other crate in the
//! workspace passes around:
//!
//! - [`SamlOptions`] - the complete protocol configuration a strategy is
//!   constructed with (the base configuration)
//! - [`SamlOptionsOverlay`] - a partial, per-tenant fragment returned by a
//!   config resolver
//! - [`SamlOptions::overlay`] - produces the effective configuration for one
//!   request without touching the base
//!
//! ## Example
//!
//! ```
//! use mtsaml_core::{SamlOptions, SamlOptionsOverlay};
//!
//! let base = SamlOptions::default();
//! let tenant = SamlOptionsOverlay::default()
//!     .issuer("tenant-a")
//!     .cert("MIIC...");
//!
//! let effective = base.overlay(&tenant);
//! assert_eq!(effective.issuer, "tenant-a");
//! assert_eq!(base.issuer, "onelogin_saml");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;

pub use config::{SamlOptions, SamlOptionsOverlay, DEFAULT_REQUEST_ID_EXPIRATION_MS};
pub use constants::{AuthnContextClass, NameIdFormat, SamlBinding, SignatureAlgorithm};
pub use error::{Error, Result};
