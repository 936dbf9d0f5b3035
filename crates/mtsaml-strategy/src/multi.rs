//! Multi-tenant SAML strategy.
//!
//! One [`MultiSamlStrategy`] serves every tenant. Each operation resolves the
//! tenant's overlay, derives the effective options from the frozen
//! [`BaseConfig`], builds a fresh engine and hands the resulting
//! [`RequestScope`] to the shared strategy behaviour. The scope never outlives
//! the call, so concurrent requests for different tenants cannot observe each
//! other's configuration.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use mtsaml_cache::ReplayStore;
use mtsaml_core::SamlOptions;
use tokio::task::JoinHandle;

use crate::engine::{EngineError, EngineFactory};
use crate::error::{StrategyError, StrategyResult};
use crate::outcome::{AuthOutcome, AuthenticateOptions};
use crate::request::SamlRequest;
use crate::resolver::ConfigResolver;
use crate::strategy::{BaseConfig, RequestScope, Strategy, StrategyCore, DEFAULT_STRATEGY_NAME};
use crate::verify::Verify;

/// Builder for [`MultiSamlStrategy`].
#[derive(Default)]
pub struct MultiSamlStrategyBuilder {
    name: Option<String>,
    options: SamlOptions,
    resolver: Option<Arc<dyn ConfigResolver>>,
    factory: Option<Arc<dyn EngineFactory>>,
    verify: Option<Arc<dyn Verify>>,
    replay_store: Option<Arc<dyn ReplayStore>>,
}

impl MultiSamlStrategyBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy name (default `saml`).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the base options shared by every tenant.
    #[must_use]
    pub fn options(mut self, options: SamlOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the config resolver. Required.
    #[must_use]
    pub fn resolver(mut self, resolver: impl ConfigResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the engine factory. Required.
    #[must_use]
    pub fn factory(mut self, factory: impl EngineFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets the verify callback. Required.
    #[must_use]
    pub fn verify(mut self, verify: impl Verify + 'static) -> Self {
        self.verify = Some(Arc::new(verify));
        self
    }

    /// Sets the replay store shared by every tenant.
    #[must_use]
    pub fn replay_store(mut self, replay_store: Arc<dyn ReplayStore>) -> Self {
        self.replay_store = Some(replay_store);
        self
    }

    /// Builds the strategy, resolving construction-time defaults.
    ///
    /// ## Errors
    ///
    /// Returns [`StrategyError::Configuration`] if the resolver, the verify
    /// callback or the engine factory is missing.
    pub fn build(self) -> StrategyResult<MultiSamlStrategy> {
        let resolver = self.resolver.ok_or_else(|| {
            StrategyError::Configuration("a config resolver must be provided".to_string())
        })?;
        let verify = self.verify.ok_or_else(|| {
            StrategyError::Configuration("a verify callback must be provided".to_string())
        })?;
        let factory = self.factory.ok_or_else(|| {
            StrategyError::Configuration("an engine factory must be provided".to_string())
        })?;

        let base = BaseConfig::with_defaults(self.options, self.replay_store);
        let name = self.name.unwrap_or_else(|| DEFAULT_STRATEGY_NAME.to_string());

        tracing::debug!(
            strategy = %name,
            request_id_expiration_ms = base.request_id_expiration_period_ms(),
            "Multi-tenant SAML strategy constructed"
        );

        Ok(MultiSamlStrategy {
            core: StrategyCore::new(name, verify),
            base,
            resolver,
            factory,
        })
    }
}

/// SAML strategy whose options are resolved per request.
pub struct MultiSamlStrategy {
    core: StrategyCore,
    base: BaseConfig,
    resolver: Arc<dyn ConfigResolver>,
    factory: Arc<dyn EngineFactory>,
}

impl MultiSamlStrategy {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> MultiSamlStrategyBuilder {
        MultiSamlStrategyBuilder::new()
    }

    /// Base configuration.
    #[must_use]
    pub const fn base(&self) -> &BaseConfig {
        &self.base
    }

    /// Resolves, merges, validates and builds the scope for one request.
    async fn scope_for(&self, request: &SamlRequest) -> StrategyResult<RequestScope> {
        let overlay = self.resolver.resolve(request).await.map_err(|err| {
            tracing::warn!(
                strategy = %self.core.name(),
                url = %request.url,
                error = %err,
                "Config resolution failed"
            );
            StrategyError::ConfigResolution(err)
        })?;

        let options = self.base.options().overlay(&overlay);
        if let Err(err) = options.validate() {
            tracing::warn!(
                strategy = %self.core.name(),
                issuer = %options.issuer,
                error = %err,
                "Effective options are invalid"
            );
            return Err(err.into());
        }

        let engine = self
            .factory
            .create(&options, Arc::clone(self.base.replay_store()))?;

        tracing::debug!(
            strategy = %self.core.name(),
            issuer = %options.issuer,
            "Built request-scoped engine"
        );

        Ok(RequestScope::new(options, engine))
    }

    /// Generates service provider metadata for the tenant of `request`.
    ///
    /// ## Errors
    ///
    /// Returns the resolver's error unchanged, or any error from validation,
    /// engine construction or metadata generation.
    pub async fn generate_service_provider_metadata(
        &self,
        request: &SamlRequest,
        decryption_cert: Option<&str>,
        signing_cert: Option<&str>,
    ) -> StrategyResult<String> {
        let scope = self.scope_for(request).await?;
        StrategyCore::generate_service_provider_metadata(&scope, decryption_cert, signing_cert)
    }

    /// Callback form of [`Self::generate_service_provider_metadata`].
    ///
    /// Metadata depends on the request's tenant, so it can never be produced
    /// synchronously. Without a callback the call fails immediately and the
    /// resolver is not invoked. Otherwise the work runs on a spawned task and
    /// `callback` receives the result. A panic in the resolver, the factory or
    /// the engine is reported to `callback` as [`EngineError::Internal`].
    ///
    /// ## Errors
    ///
    /// Returns [`StrategyError::InvalidUsage`] if `callback` is `None` or no
    /// tokio runtime is running.
    pub fn generate_service_provider_metadata_with<F>(
        self: &Arc<Self>,
        request: SamlRequest,
        decryption_cert: Option<String>,
        signing_cert: Option<String>,
        callback: Option<F>,
    ) -> StrategyResult<JoinHandle<()>>
    where
        F: FnOnce(StrategyResult<String>) + Send + 'static,
    {
        let Some(callback) = callback else {
            return Err(StrategyError::InvalidUsage(
                "Metadata can't be provided synchronously for MultiSamlStrategy.".to_string(),
            ));
        };
        let handle = tokio::runtime::Handle::try_current().map_err(|err| {
            StrategyError::InvalidUsage(format!("metadata generation needs a tokio runtime: {err}"))
        })?;

        let strategy = Arc::clone(self);
        Ok(handle.spawn(async move {
            let generation = strategy.generate_service_provider_metadata(
                &request,
                decryption_cert.as_deref(),
                signing_cert.as_deref(),
            );
            let result = match AssertUnwindSafe(generation).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(
                        strategy = %strategy.core.name(),
                        "Metadata generation panicked"
                    );
                    Err(StrategyError::Engine(EngineError::Internal(
                        "metadata generation panicked".to_string(),
                    )))
                }
            };
            callback(result);
        }))
    }
}

impl fmt::Debug for MultiSamlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSamlStrategy")
            .field("name", &self.core.name())
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Strategy for MultiSamlStrategy {
    fn name(&self) -> &str {
        self.core.name()
    }

    async fn authenticate(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
    ) -> AuthOutcome {
        match self.scope_for(request).await {
            Ok(scope) => self.core.authenticate(request, options, &scope).await,
            Err(err) => AuthOutcome::Error(err),
        }
    }

    async fn logout(&self, request: &SamlRequest) -> StrategyResult<String> {
        let scope = self.scope_for(request).await?;
        self.core.logout(request, &scope).await
    }
}
