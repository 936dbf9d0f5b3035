//! Application verify callback.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::Profile;
use crate::error::BoxError;
use crate::request::SamlRequest;

/// Result of verifying a validated profile.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// The profile maps to an application user.
    Success {
        /// Application user.
        user: serde_json::Value,
        /// Extra info passed to the framework.
        info: Option<serde_json::Value>,
    },
    /// The profile does not map to a user.
    Fail {
        /// Info passed to the framework as challenge.
        info: Option<serde_json::Value>,
    },
}

impl VerifyOutcome {
    /// Successful verification without extra info.
    #[must_use]
    pub const fn success(user: serde_json::Value) -> Self {
        Self::Success { user, info: None }
    }

    /// Failed verification without extra info.
    #[must_use]
    pub const fn fail() -> Self {
        Self::Fail { info: None }
    }
}

/// Maps a validated profile to an application user.
#[async_trait]
pub trait Verify: Send + Sync {
    /// Verifies `profile`, received on `request`.
    ///
    /// ## Errors
    ///
    /// An error aborts authentication and is reported as
    /// [`crate::StrategyError::Verify`].
    async fn verify(&self, request: &SamlRequest, profile: &Profile)
        -> Result<VerifyOutcome, BoxError>;
}

#[async_trait]
impl<T: Verify + ?Sized> Verify for Arc<T> {
    async fn verify(
        &self,
        request: &SamlRequest,
        profile: &Profile,
    ) -> Result<VerifyOutcome, BoxError> {
        (**self).verify(request, profile).await
    }
}

/// [`Verify`] backed by a closure over the profile. Created with [`verify_fn`].
pub struct FnVerify<F> {
    f: F,
}

impl<F> fmt::Debug for FnVerify<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnVerify").finish_non_exhaustive()
    }
}

/// Wraps a closure as a [`Verify`]. The closure receives an owned copy of the profile.
pub fn verify_fn<F, Fut>(f: F) -> FnVerify<F>
where
    F: Fn(Profile) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<VerifyOutcome, BoxError>> + Send + 'static,
{
    FnVerify { f }
}

#[async_trait]
impl<F, Fut> Verify for FnVerify<F>
where
    F: Fn(Profile) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<VerifyOutcome, BoxError>> + Send + 'static,
{
    async fn verify(
        &self,
        _request: &SamlRequest,
        profile: &Profile,
    ) -> Result<VerifyOutcome, BoxError> {
        (self.f)(profile.clone()).await
    }
}
