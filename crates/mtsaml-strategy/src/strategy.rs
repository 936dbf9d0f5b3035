//! Shared strategy behaviour and the single-tenant strategy.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mtsaml_cache::{InMemoryReplayStore, ReplayStore};
use mtsaml_core::{SamlBinding, SamlOptions, DEFAULT_REQUEST_ID_EXPIRATION_MS};

use crate::engine::{EngineError, EngineFactory, ProtocolEngine, ValidatedMessage};
use crate::error::{StrategyError, StrategyResult};
use crate::outcome::{AuthOutcome, AuthenticateOptions, SamlFallback};
use crate::request::SamlRequest;
use crate::verify::{Verify, VerifyOutcome};

/// Default strategy name.
pub const DEFAULT_STRATEGY_NAME: &str = "saml";

const SAML_RESPONSE: &str = "SAMLResponse";
const SAML_REQUEST: &str = "SAMLRequest";

/// A request handler-facing authentication strategy.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name the strategy is registered under.
    fn name(&self) -> &str;

    /// Processes an inbound request.
    ///
    /// Every failure is reported as [`AuthOutcome::Error`].
    async fn authenticate(&self, request: &SamlRequest, options: &AuthenticateOptions)
        -> AuthOutcome;

    /// Builds the identity provider logout URL for `request.user`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the URL cannot be produced.
    async fn logout(&self, request: &SamlRequest) -> StrategyResult<String>;
}

/// Base configuration, resolved once when a strategy is constructed.
///
/// The request ID expiration is always set and the replay store always
/// present. Read-only afterwards.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    options: SamlOptions,
    replay_store: Arc<dyn ReplayStore>,
}

impl BaseConfig {
    /// Fills in construction-time defaults.
    ///
    /// A missing or zero request ID expiration becomes
    /// [`DEFAULT_REQUEST_ID_EXPIRATION_MS`]. A missing replay store becomes an
    /// [`InMemoryReplayStore`] using that expiration.
    #[must_use]
    pub fn with_defaults(
        mut options: SamlOptions,
        replay_store: Option<Arc<dyn ReplayStore>>,
    ) -> Self {
        let expiration_ms = options
            .request_id_expiration_period_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REQUEST_ID_EXPIRATION_MS);
        options.request_id_expiration_period_ms = Some(expiration_ms);

        let replay_store = replay_store.unwrap_or_else(|| {
            tracing::info!(
                expiration_ms,
                "No replay store configured, using in-memory store"
            );
            Arc::new(InMemoryReplayStore::new(Duration::from_millis(expiration_ms)))
        });

        Self {
            options,
            replay_store,
        }
    }

    /// Base options.
    #[must_use]
    pub const fn options(&self) -> &SamlOptions {
        &self.options
    }

    /// Shared replay store.
    #[must_use]
    pub const fn replay_store(&self) -> &Arc<dyn ReplayStore> {
        &self.replay_store
    }

    /// Request ID expiration in milliseconds.
    #[must_use]
    pub fn request_id_expiration_period_ms(&self) -> u64 {
        self.options
            .request_id_expiration_period_ms
            .unwrap_or(DEFAULT_REQUEST_ID_EXPIRATION_MS)
    }

    /// Request ID expiration.
    #[must_use]
    pub fn request_id_expiration(&self) -> Duration {
        self.options.request_id_expiration()
    }
}

/// The effective options and engine for one operation.
///
/// Owned by the operation that built it and dropped when it completes.
pub struct RequestScope {
    options: SamlOptions,
    engine: Box<dyn ProtocolEngine>,
}

impl RequestScope {
    /// Pairs effective options with the engine built from them.
    #[must_use]
    pub fn new(options: SamlOptions, engine: Box<dyn ProtocolEngine>) -> Self {
        Self { options, engine }
    }

    /// Effective options.
    #[must_use]
    pub const fn options(&self) -> &SamlOptions {
        &self.options
    }

    /// Engine bound to the effective options.
    #[must_use]
    pub fn engine(&self) -> &dyn ProtocolEngine {
        self.engine.as_ref()
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("issuer", &self.options.issuer)
            .finish_non_exhaustive()
    }
}

/// Strategy behaviour, parameterised by the scope of each call.
pub(crate) struct StrategyCore {
    name: String,
    verify: Arc<dyn Verify>,
}

impl StrategyCore {
    pub(crate) fn new(name: impl Into<String>, verify: Arc<dyn Verify>) -> Self {
        Self {
            name: name.into(),
            verify,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) async fn authenticate(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
        scope: &RequestScope,
    ) -> AuthOutcome {
        match self.try_authenticate(request, options, scope).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(strategy = %self.name, error = %err, "Authentication failed");
                AuthOutcome::Error(err)
            }
        }
    }

    async fn try_authenticate(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
        scope: &RequestScope,
    ) -> StrategyResult<AuthOutcome> {
        let engine = scope.engine();

        let message = if request.query.contains_key(SAML_RESPONSE)
            || request.query.contains_key(SAML_REQUEST)
        {
            engine
                .validate_redirect(&request.query, request.original_query())
                .await?
        } else if request.body.contains_key(SAML_RESPONSE) {
            engine.validate_post_response(&request.body).await?
        } else if request.body.contains_key(SAML_REQUEST) {
            engine.validate_post_request(&request.body).await?
        } else {
            return self.initiate(request, options, scope).await;
        };

        self.complete(request, options, scope, message).await
    }

    /// Starts a login or logout at the identity provider.
    async fn initiate(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
        scope: &RequestScope,
    ) -> StrategyResult<AuthOutcome> {
        let engine = scope.engine();
        match options.saml_fallback {
            SamlFallback::LoginRequest => {
                if scope.options().authn_request_binding == SamlBinding::HttpPost {
                    Ok(AuthOutcome::Form(engine.authorize_form(request).await?))
                } else {
                    Ok(AuthOutcome::Redirect(
                        engine.authorize_url(request, options).await?,
                    ))
                }
            }
            SamlFallback::LogoutRequest => Ok(AuthOutcome::Redirect(
                engine.logout_url(request, options).await?,
            )),
        }
    }

    /// Finishes handling of a validated inbound message.
    async fn complete(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
        scope: &RequestScope,
        message: ValidatedMessage,
    ) -> StrategyResult<AuthOutcome> {
        if message.logged_out {
            let redirect = match message.profile {
                Some(logout_request) => Some(
                    scope
                        .engine()
                        .logout_response_url(request, &logout_request, options)
                        .await?,
                ),
                None => None,
            };
            return Ok(AuthOutcome::EndSession { redirect });
        }

        let profile = message.profile.ok_or_else(|| {
            EngineError::InvalidResponse("validated response carried no profile".to_string())
        })?;

        let outcome = self
            .verify
            .verify(request, &profile)
            .await
            .map_err(StrategyError::Verify)?;

        Ok(match outcome {
            VerifyOutcome::Success { user, info } => AuthOutcome::Success { user, info },
            VerifyOutcome::Fail { info } => AuthOutcome::Fail {
                challenge: info,
                status: 401,
            },
        })
    }

    pub(crate) async fn logout(
        &self,
        request: &SamlRequest,
        scope: &RequestScope,
    ) -> StrategyResult<String> {
        Ok(scope
            .engine()
            .logout_url(request, &AuthenticateOptions::default())
            .await?)
    }

    pub(crate) fn generate_service_provider_metadata(
        scope: &RequestScope,
        decryption_cert: Option<&str>,
        signing_cert: Option<&str>,
    ) -> StrategyResult<String> {
        Ok(scope
            .engine()
            .generate_service_provider_metadata(decryption_cert, signing_cert)?)
    }
}

/// Single-tenant SAML strategy.
///
/// The engine is built once at construction from the base options, and every
/// request is served by it.
pub struct SamlStrategy {
    core: StrategyCore,
    base: BaseConfig,
    scope: RequestScope,
}

impl SamlStrategy {
    /// Creates a strategy.
    ///
    /// ## Errors
    ///
    /// Returns an error if the options are invalid or the factory fails.
    pub fn new<F>(
        options: SamlOptions,
        factory: &F,
        verify: Arc<dyn Verify>,
        replay_store: Option<Arc<dyn ReplayStore>>,
    ) -> StrategyResult<Self>
    where
        F: EngineFactory + ?Sized,
    {
        let base = BaseConfig::with_defaults(options, replay_store);
        base.options().validate()?;

        let engine = factory.create(base.options(), Arc::clone(base.replay_store()))?;
        let scope = RequestScope::new(base.options().clone(), engine);

        Ok(Self {
            core: StrategyCore::new(DEFAULT_STRATEGY_NAME, verify),
            base,
            scope,
        })
    }

    /// Sets the strategy name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.core.set_name(name);
        self
    }

    /// Base configuration.
    #[must_use]
    pub const fn base(&self) -> &BaseConfig {
        &self.base
    }

    /// Generates service provider metadata XML.
    ///
    /// ## Errors
    ///
    /// Returns an error if the engine cannot produce metadata.
    pub fn generate_service_provider_metadata(
        &self,
        decryption_cert: Option<&str>,
        signing_cert: Option<&str>,
    ) -> StrategyResult<String> {
        StrategyCore::generate_service_provider_metadata(&self.scope, decryption_cert, signing_cert)
    }
}

impl fmt::Debug for SamlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlStrategy")
            .field("name", &self.core.name())
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Strategy for SamlStrategy {
    fn name(&self) -> &str {
        self.core.name()
    }

    async fn authenticate(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
    ) -> AuthOutcome {
        self.core.authenticate(request, options, &self.scope).await
    }

    async fn logout(&self, request: &SamlRequest) -> StrategyResult<String> {
        self.core.logout(request, &self.scope).await
    }
}
