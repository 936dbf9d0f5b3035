//! # mtsaml-cache
//!
//! Replay store abstraction for SAML request ID tracking.
//!
//! A protocol engine records the ID of every `AuthnRequest` it issues and
//! checks `InResponseTo` on the way back, rejecting duplicate or stale
//! responses. This crate defines the store it does that through:
//!
//! - [`ReplayStore`] - save/get/remove of request IDs
//! - [`InMemoryReplayStore`] - default in-process store with key expiration
//!
//! ## Example
//!
//! ```ignore
//! use mtsaml_cache::{InMemoryReplayStore, ReplayStore};
//! use std::time::Duration;
//!
//! let store = InMemoryReplayStore::new(Duration::from_secs(8 * 3600));
//! assert!(store.save("_a1b2", "2024-01-01T00:00:00Z").await?.is_some());
//! assert!(store.save("_a1b2", "2024-01-01T00:00:00Z").await?.is_none());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use memory::InMemoryReplayStore;
pub use store::ReplayStore;
