//! Authentication options and outcomes.

use std::collections::BTreeMap;

use crate::error::StrategyError;

/// What to start when a request carries no SAML message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamlFallback {
    /// Send the user to the identity provider to log in.
    #[default]
    LoginRequest,
    /// Send the user to the identity provider to log out.
    LogoutRequest,
}

/// Per-call options for [`crate::Strategy::authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticateOptions {
    /// Fallback when the request carries no SAML message.
    pub saml_fallback: SamlFallback,
    /// Extra query parameters for the identity provider request.
    pub additional_params: BTreeMap<String, String>,
}

impl AuthenticateOptions {
    /// Options that start a logout when no SAML message is present.
    #[must_use]
    pub fn logout() -> Self {
        Self {
            saml_fallback: SamlFallback::LogoutRequest,
            ..Self::default()
        }
    }

    /// Adds an extra query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_params.insert(key.into(), value.into());
        self
    }
}

/// Result of [`crate::Strategy::authenticate`], consumed by the framework adapter.
#[derive(Debug)]
pub enum AuthOutcome {
    /// The user was authenticated.
    Success {
        /// User returned by the verify callback.
        user: serde_json::Value,
        /// Additional info returned by the verify callback.
        info: Option<serde_json::Value>,
    },
    /// Authentication failed.
    Fail {
        /// Challenge or info returned by the verify callback.
        challenge: Option<serde_json::Value>,
        /// HTTP status to answer with.
        status: u16,
    },
    /// Redirect the user agent.
    Redirect(String),
    /// Answer with this HTML document (auto-submitting form).
    Form(String),
    /// End the local session, then redirect if a URL is given or continue otherwise.
    EndSession {
        /// Logout response URL to redirect to.
        redirect: Option<String>,
    },
    /// The operation failed.
    Error(StrategyError),
}

impl AuthOutcome {
    /// Checks if this is a success outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Checks if this is an error outcome.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the error, if this is an error outcome.
    #[must_use]
    pub const fn error(&self) -> Option<&StrategyError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the redirect target of a redirect or end-session outcome.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Redirect(url) => Some(url),
            Self::EndSession { redirect } => redirect.as_deref(),
            _ => None,
        }
    }
}

impl From<StrategyError> for AuthOutcome {
    fn from(err: StrategyError) -> Self {
        Self::Error(err)
    }
}
