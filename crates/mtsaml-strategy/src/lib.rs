//! SAML authentication strategies for multi-tenant deployments.
//!
//! A strategy turns an incoming request into an authentication outcome
//! (success, failure, redirect to the identity provider, ...) by delegating
//! protocol work to a [`ProtocolEngine`]. This crate provides:
//!
//! - [`SamlStrategy`] - single-tenant strategy with one engine built at startup
//! - [`MultiSamlStrategy`] - one shared strategy whose configuration is
//!   resolved per request through a [`ConfigResolver`]
//!
//! # Architecture
//!
//! The protocol engine itself is an external collaborator, supplied as an
//! [`EngineFactory`]. For every operation the multi-tenant strategy:
//!
//! 1. resolves the tenant's [`SamlOptionsOverlay`] (the only suspension point)
//! 2. overlays it onto the immutable [`BaseConfig`]
//! 3. validates the effective options and builds a fresh engine
//! 4. runs the shared strategy behaviour against that engine
//!
//! The effective options and engine live in a [`RequestScope`] owned by the
//! call; nothing request-specific is ever stored on the strategy.
//!
//! # Example
//!
//! ```rust,ignore
//! use mtsaml_strategy::{resolver_fn, verify_fn, MultiSamlStrategy, SamlOptionsOverlay};
//!
//! let strategy = MultiSamlStrategy::builder()
//!     .resolver(resolver_fn(|req: &SamlRequest| {
//!         let tenant = req.header("x-tenant").map(str::to_owned);
//!         async move { tenants.lookup(tenant).await }
//!     }))
//!     .factory(my_engine_factory)
//!     .verify(verify_fn(|profile| async move { Ok(VerifyOutcome::success(profile.name_id.into())) }))
//!     .build()?;
//!
//! let outcome = strategy.authenticate(&request, &AuthenticateOptions::default()).await;
//! ```
//!
//! # Timeouts
//!
//! No timeout is applied to config resolution. A resolver that never
//! completes leaves the operation pending; bounding resolution time is the
//! resolver's responsibility.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod multi;
pub mod outcome;
pub mod request;
pub mod resolver;
pub mod strategy;
pub mod verify;

#[cfg(test)]
mod test_support;

pub use engine::{EngineError, EngineFactory, EngineResult, Profile, ProtocolEngine, ValidatedMessage};
pub use error::{BoxError, StrategyError, StrategyResult};
pub use multi::{MultiSamlStrategy, MultiSamlStrategyBuilder};
pub use outcome::{AuthOutcome, AuthenticateOptions, SamlFallback};
pub use request::SamlRequest;
pub use resolver::{resolver_fn, ConfigResolver, FnResolver};
pub use strategy::{BaseConfig, RequestScope, SamlStrategy, Strategy};
pub use verify::{verify_fn, FnVerify, Verify, VerifyOutcome};

pub use mtsaml_cache::{InMemoryReplayStore, ReplayStore};
pub use mtsaml_core::{SamlOptions, SamlOptionsOverlay};
