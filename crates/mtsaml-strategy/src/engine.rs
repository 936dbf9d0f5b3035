//! Protocol engine capability.
//!
//! A protocol engine builds and validates SAML messages for one fixed set of
//! options. Engines are created by an [`EngineFactory`]; the multi-tenant
//! strategy asks for a fresh engine on every request, so implementations must
//! not rely on being reused.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use mtsaml_cache::{CacheError, ReplayStore};
use mtsaml_core::SamlOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::AuthenticateOptions;
use crate::request::SamlRequest;

/// Result type for protocol engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Protocol engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid SAML request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid SAML response format or content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// XML signature validation failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// `InResponseTo` did not match a tracked request ID.
    #[error("unknown or replayed request ID: {0}")]
    InvalidInResponseTo(String),

    /// The engine could not be constructed from the given options.
    #[error("engine construction failed: {0}")]
    Construction(String),

    /// The replay store failed.
    #[error("replay store error: {0}")]
    Cache(#[from] CacheError),

    /// Internal engine error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::InvalidResponse(_) => 400,
            Self::SignatureInvalid(_) | Self::InvalidInResponseTo(_) => 401,
            Self::Construction(_) | Self::Cache(_) | Self::Internal(_) => 500,
        }
    }
}

/// Identity asserted by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Issuer of the assertion or logout request.
    pub issuer: Option<String>,
    /// Subject name ID.
    pub name_id: String,
    /// Subject name ID format URI.
    pub name_id_format: Option<String>,
    /// Identity provider session index.
    pub session_index: Option<String>,
    /// ID of the request this message answers.
    pub in_response_to: Option<String>,
    /// Assertion attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Profile {
    /// Creates a profile for the given subject.
    #[must_use]
    pub fn new(name_id: impl Into<String>) -> Self {
        Self {
            name_id: name_id.into(),
            ..Self::default()
        }
    }

    /// Sets the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the session index.
    #[must_use]
    pub fn with_session_index(mut self, session_index: impl Into<String>) -> Self {
        self.session_index = Some(session_index.into());
        self
    }

    /// Gets an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }
}

/// Result of validating an inbound SAML message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedMessage {
    /// Subject of a login response, or the originator of a logout request.
    pub profile: Option<Profile>,
    /// True when the message was a logout request or logout response.
    pub logged_out: bool,
}

impl ValidatedMessage {
    /// A validated login response.
    #[must_use]
    pub const fn login(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            logged_out: false,
        }
    }

    /// A validated logout request from the identity provider.
    #[must_use]
    pub const fn logout_request(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            logged_out: true,
        }
    }

    /// A validated logout response to a logout we initiated.
    #[must_use]
    pub const fn logout_response() -> Self {
        Self {
            profile: None,
            logged_out: true,
        }
    }
}

/// SAML protocol engine.
///
/// An engine instance is bound to one set of effective options. Strategy
/// behaviour never assumes a particular engine; it operates on whichever
/// instance it is handed.
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Validates a message delivered with the HTTP-Redirect binding.
    ///
    /// `original_query` is the undecoded query string, needed to check
    /// detached redirect signatures.
    async fn validate_redirect(
        &self,
        query: &HashMap<String, String>,
        original_query: &str,
    ) -> EngineResult<ValidatedMessage>;

    /// Validates a `SAMLResponse` delivered with the HTTP-POST binding.
    async fn validate_post_response(
        &self,
        body: &HashMap<String, String>,
    ) -> EngineResult<ValidatedMessage>;

    /// Validates a `SAMLRequest` (logout request) delivered with the HTTP-POST binding.
    async fn validate_post_request(
        &self,
        body: &HashMap<String, String>,
    ) -> EngineResult<ValidatedMessage>;

    /// Builds the identity provider URL that starts a login.
    async fn authorize_url(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
    ) -> EngineResult<String>;

    /// Builds an auto-submitting HTML form that starts a login (HTTP-POST binding).
    async fn authorize_form(&self, request: &SamlRequest) -> EngineResult<String>;

    /// Builds the identity provider URL that starts a logout for `request.user`.
    async fn logout_url(
        &self,
        request: &SamlRequest,
        options: &AuthenticateOptions,
    ) -> EngineResult<String>;

    /// Builds the URL answering an identity-provider-initiated logout request.
    async fn logout_response_url(
        &self,
        request: &SamlRequest,
        logout_request: &Profile,
        options: &AuthenticateOptions,
    ) -> EngineResult<String>;

    /// Generates service provider metadata XML.
    fn generate_service_provider_metadata(
        &self,
        decryption_cert: Option<&str>,
        signing_cert: Option<&str>,
    ) -> EngineResult<String>;
}

/// Factory for protocol engines.
///
/// Called with fully merged, validated options and the shared replay store.
/// Each call must return an independent engine.
pub trait EngineFactory: Send + Sync {
    /// Creates an engine bound to `options`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the options cannot produce an engine.
    fn create(
        &self,
        options: &SamlOptions,
        replay_store: Arc<dyn ReplayStore>,
    ) -> EngineResult<Box<dyn ProtocolEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&SamlOptions, Arc<dyn ReplayStore>) -> EngineResult<Box<dyn ProtocolEngine>>
        + Send
        + Sync,
{
    fn create(
        &self,
        options: &SamlOptions,
        replay_store: Arc<dyn ReplayStore>,
    ) -> EngineResult<Box<dyn ProtocolEngine>> {
        self(options, replay_store)
    }
}
