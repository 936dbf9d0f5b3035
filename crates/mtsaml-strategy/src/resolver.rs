//! Per-request configuration resolution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use mtsaml_core::SamlOptionsOverlay;

use crate::error::BoxError;
use crate::request::SamlRequest;

/// Maps an incoming request to its tenant's option overlay.
///
/// This is the only point where a multi-tenant operation suspends. No timeout
/// is applied around it; a resolver talking to a remote store should bound
/// its own latency.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    /// Resolves the overlay for `request`.
    ///
    /// ## Errors
    ///
    /// Any error returned here is surfaced unchanged to the caller of the
    /// strategy operation, and no engine is built for the request.
    async fn resolve(&self, request: &SamlRequest) -> Result<SamlOptionsOverlay, BoxError>;
}

#[async_trait]
impl<T: ConfigResolver + ?Sized> ConfigResolver for Arc<T> {
    async fn resolve(&self, request: &SamlRequest) -> Result<SamlOptionsOverlay, BoxError> {
        (**self).resolve(request).await
    }
}

/// [`ConfigResolver`] backed by a closure. Created with [`resolver_fn`].
pub struct FnResolver<F> {
    f: F,
}

impl<F> fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

/// Wraps a closure as a [`ConfigResolver`].
///
/// The closure must copy whatever it needs out of the request before
/// returning its future.
///
/// ```rust,ignore
/// let resolver = resolver_fn(|req: &SamlRequest| {
///     let tenant = req.header("x-tenant").unwrap_or_default().to_owned();
///     async move { directory.overlay_for(&tenant).await }
/// });
/// ```
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(&SamlRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SamlOptionsOverlay, BoxError>> + Send + 'static,
{
    FnResolver { f }
}

#[async_trait]
impl<F, Fut> ConfigResolver for FnResolver<F>
where
    F: Fn(&SamlRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SamlOptionsOverlay, BoxError>> + Send + 'static,
{
    async fn resolve(&self, request: &SamlRequest) -> Result<SamlOptionsOverlay, BoxError> {
        (self.f)(request).await
    }
}
