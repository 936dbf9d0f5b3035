//! Replay store trait.

use std::any::Any;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Store of SAML request IDs used to detect replayed or unsolicited responses.
///
/// Implementations must be thread-safe: one store is shared by every request
/// a strategy serves, and keys are expected to expire on their own.
#[async_trait]
pub trait ReplayStore: Send + Sync + Debug + Any {
    /// Stores `value` under `key`.
    ///
    /// Returns the stored value if the key was newly inserted, or `None` if a
    /// live entry already exists for the key. An existing entry is never
    /// overwritten.
    async fn save(&self, key: &str, value: &str) -> CacheResult<Option<String>>;

    /// Gets the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Removes `key` from the store.
    ///
    /// Returns the removed key, or `None` if nothing live was stored under it.
    async fn remove(&self, key: &str) -> CacheResult<Option<String>>;

    /// Returns a reference to self as Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}
