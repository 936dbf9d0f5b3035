//! SAML strategy options.
//!
//! [`SamlOptions`] is the base configuration a strategy is constructed with.
//! A config resolver returns a [`SamlOptionsOverlay`] per request, and
//! [`SamlOptions::overlay`] combines the two into the effective options for
//! that single request. The base value is never mutated.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{AuthnContextClass, NameIdFormat, SamlBinding, SignatureAlgorithm};
use crate::error::{Error, Result};

/// Default lifetime of a tracked request ID: 8 hours.
pub const DEFAULT_REQUEST_ID_EXPIRATION_MS: u64 = 28_800_000;

/// Complete protocol configuration for a SAML service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamlOptions {
    /// Service provider entity ID.
    pub issuer: String,
    /// Identity provider SSO endpoint.
    pub entry_point: Option<String>,
    /// Absolute assertion consumer URL. Built from `protocol`, `host` and `path` when absent.
    pub callback_url: Option<String>,
    /// Assertion consumer path.
    pub path: String,
    /// Protocol used to build the callback URL (`http://` or `https://`).
    pub protocol: Option<String>,
    /// Host used to build the callback URL.
    pub host: String,
    /// Identity provider signing certificate (PEM body).
    pub cert: Option<String>,
    /// Service provider private key used to sign requests.
    pub private_key: Option<String>,
    /// Service provider private key used to decrypt assertions.
    pub decryption_pvk: Option<String>,
    /// Signature algorithm for signed requests.
    pub signature_algorithm: SignatureAlgorithm,
    /// Requested name ID format URI.
    pub identifier_format: Option<String>,
    /// Reject responses whose assertions are not signed.
    pub want_assertions_signed: bool,
    /// Allowed clock skew in milliseconds; `-1` disables time checks.
    pub accepted_clock_skew_ms: i64,
    /// Expected audience of assertions.
    pub audience: Option<String>,
    /// Expected issuer of identity provider responses.
    pub idp_issuer: Option<String>,
    /// Requested authentication context class URIs.
    pub authn_context: Vec<String>,
    /// Omit `RequestedAuthnContext` from login requests.
    pub disable_request_authn_context: bool,
    /// Ask the identity provider to re-authenticate the user.
    pub force_authn: bool,
    /// Send login requests without deflate compression.
    pub skip_request_compression: bool,
    /// Binding used to deliver login requests.
    pub authn_request_binding: SamlBinding,
    /// Check `InResponseTo` against the replay store.
    pub validate_in_response_to: bool,
    /// Lifetime of tracked request IDs in milliseconds.
    pub request_id_expiration_period_ms: Option<u64>,
    /// Identity provider single logout endpoint.
    pub logout_url: Option<String>,
    /// Service provider single logout callback.
    pub logout_callback_url: Option<String>,
    /// Extra query parameters for every identity provider request.
    pub additional_params: BTreeMap<String, String>,
    /// Extra query parameters for login requests.
    pub additional_authorize_params: BTreeMap<String, String>,
    /// Extra query parameters for logout requests.
    pub additional_logout_params: BTreeMap<String, String>,
}

impl Default for SamlOptions {
    fn default() -> Self {
        Self {
            issuer: "onelogin_saml".to_string(),
            entry_point: None,
            callback_url: None,
            path: "/saml/consume".to_string(),
            protocol: None,
            host: "localhost".to_string(),
            cert: None,
            private_key: None,
            decryption_pvk: None,
            signature_algorithm: SignatureAlgorithm::default(),
            identifier_format: Some(NameIdFormat::default().uri().to_string()),
            want_assertions_signed: false,
            accepted_clock_skew_ms: 0,
            audience: None,
            idp_issuer: None,
            authn_context: vec![AuthnContextClass::default().uri().to_string()],
            disable_request_authn_context: false,
            force_authn: false,
            skip_request_compression: false,
            authn_request_binding: SamlBinding::default(),
            validate_in_response_to: false,
            request_id_expiration_period_ms: None,
            logout_url: None,
            logout_callback_url: None,
            additional_params: BTreeMap::new(),
            additional_authorize_params: BTreeMap::new(),
            additional_logout_params: BTreeMap::new(),
        }
    }
}

impl SamlOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from `SAML_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] if a variable holds an unparseable value.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads options from an arbitrary key lookup using `SAML_*` key names.
    ///
    /// Keys that are absent keep their default value.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] if a key holds an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(v) = lookup("SAML_ISSUER") {
            options.issuer = v;
        }
        if let Some(v) = lookup("SAML_PATH") {
            options.path = v;
        }
        if let Some(v) = lookup("SAML_HOST") {
            options.host = v;
        }
        options.entry_point = lookup("SAML_ENTRY_POINT").or(options.entry_point);
        options.callback_url = lookup("SAML_CALLBACK_URL").or(options.callback_url);
        options.protocol = lookup("SAML_PROTOCOL").or(options.protocol);
        options.cert = lookup("SAML_CERT").or(options.cert);
        options.private_key = lookup("SAML_PRIVATE_KEY").or(options.private_key);
        options.decryption_pvk = lookup("SAML_DECRYPTION_PVK").or(options.decryption_pvk);
        options.identifier_format = lookup("SAML_IDENTIFIER_FORMAT").or(options.identifier_format);
        options.audience = lookup("SAML_AUDIENCE").or(options.audience);
        options.idp_issuer = lookup("SAML_IDP_ISSUER").or(options.idp_issuer);
        options.logout_url = lookup("SAML_LOGOUT_URL").or(options.logout_url);
        options.logout_callback_url =
            lookup("SAML_LOGOUT_CALLBACK_URL").or(options.logout_callback_url);

        if let Some(v) = lookup("SAML_SIGNATURE_ALGORITHM") {
            options.signature_algorithm = v.parse()?;
            if options.signature_algorithm.is_deprecated() {
                tracing::warn!("SAML_SIGNATURE_ALGORITHM={} uses a deprecated hash", v);
            }
        }
        if let Some(v) = lookup("SAML_AUTHN_REQUEST_BINDING") {
            options.authn_request_binding = v.parse()?;
        }
        if let Some(v) = lookup("SAML_AUTHN_CONTEXT") {
            options.authn_context = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("SAML_ACCEPTED_CLOCK_SKEW_MS") {
            options.accepted_clock_skew_ms = parse_value("SAML_ACCEPTED_CLOCK_SKEW_MS", &v)?;
        }
        if let Some(v) = lookup("SAML_REQUEST_ID_EXPIRATION_MS") {
            options.request_id_expiration_period_ms =
                Some(parse_value("SAML_REQUEST_ID_EXPIRATION_MS", &v)?);
        }
        if let Some(v) = lookup("SAML_WANT_ASSERTIONS_SIGNED") {
            options.want_assertions_signed = parse_bool("SAML_WANT_ASSERTIONS_SIGNED", &v)?;
        }
        if let Some(v) = lookup("SAML_VALIDATE_IN_RESPONSE_TO") {
            options.validate_in_response_to = parse_bool("SAML_VALIDATE_IN_RESPONSE_TO", &v)?;
        }
        if let Some(v) = lookup("SAML_FORCE_AUTHN") {
            options.force_authn = parse_bool("SAML_FORCE_AUTHN", &v)?;
        }
        if let Some(v) = lookup("SAML_DISABLE_REQUEST_AUTHN_CONTEXT") {
            options.disable_request_authn_context =
                parse_bool("SAML_DISABLE_REQUEST_AUTHN_CONTEXT", &v)?;
        }
        if let Some(v) = lookup("SAML_SKIP_REQUEST_COMPRESSION") {
            options.skip_request_compression = parse_bool("SAML_SKIP_REQUEST_COMPRESSION", &v)?;
        }

        Ok(options)
    }

    /// Returns the effective options for one request.
    ///
    /// Fields set in `overlay` replace the corresponding base fields; every
    /// other field keeps its base value. Map fields are replaced whole.
    /// `self` is left untouched.
    #[must_use]
    pub fn overlay(&self, overlay: &SamlOptionsOverlay) -> Self {
        let mut merged = self.clone();

        replace(&mut merged.issuer, &overlay.issuer);
        replace(&mut merged.path, &overlay.path);
        replace(&mut merged.host, &overlay.host);
        replace(&mut merged.signature_algorithm, &overlay.signature_algorithm);
        replace(&mut merged.want_assertions_signed, &overlay.want_assertions_signed);
        replace(&mut merged.accepted_clock_skew_ms, &overlay.accepted_clock_skew_ms);
        replace(&mut merged.authn_context, &overlay.authn_context);
        replace(
            &mut merged.disable_request_authn_context,
            &overlay.disable_request_authn_context,
        );
        replace(&mut merged.force_authn, &overlay.force_authn);
        replace(&mut merged.skip_request_compression, &overlay.skip_request_compression);
        replace(&mut merged.authn_request_binding, &overlay.authn_request_binding);
        replace(&mut merged.validate_in_response_to, &overlay.validate_in_response_to);
        replace(&mut merged.additional_params, &overlay.additional_params);
        replace(
            &mut merged.additional_authorize_params,
            &overlay.additional_authorize_params,
        );
        replace(&mut merged.additional_logout_params, &overlay.additional_logout_params);

        replace_some(&mut merged.entry_point, &overlay.entry_point);
        replace_some(&mut merged.callback_url, &overlay.callback_url);
        replace_some(&mut merged.protocol, &overlay.protocol);
        replace_some(&mut merged.cert, &overlay.cert);
        replace_some(&mut merged.private_key, &overlay.private_key);
        replace_some(&mut merged.decryption_pvk, &overlay.decryption_pvk);
        replace_some(&mut merged.identifier_format, &overlay.identifier_format);
        replace_some(&mut merged.audience, &overlay.audience);
        replace_some(&mut merged.idp_issuer, &overlay.idp_issuer);
        replace_some(&mut merged.logout_url, &overlay.logout_url);
        replace_some(&mut merged.logout_callback_url, &overlay.logout_callback_url);

        merged
    }

    /// Checks that these options can be used to construct a protocol engine.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Validation`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.cert.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(Error::Validation("cert must not be empty".to_string()));
        }
        if self.issuer.trim().is_empty() {
            return Err(Error::Validation("issuer must not be empty".to_string()));
        }
        if self.accepted_clock_skew_ms < -1 {
            return Err(Error::Validation(format!(
                "acceptedClockSkewMs must be -1 or greater, got {}",
                self.accepted_clock_skew_ms
            )));
        }

        for (field, value) in [
            ("entryPoint", &self.entry_point),
            ("callbackUrl", &self.callback_url),
            ("logoutUrl", &self.logout_url),
            ("logoutCallbackUrl", &self.logout_callback_url),
        ] {
            if let Some(value) = value {
                Url::parse(value)
                    .map_err(|e| Error::Validation(format!("{field} is not a valid URL: {e}")))?;
            }
        }

        Ok(())
    }

    /// Returns the assertion consumer URL, building it from `protocol`, `host`
    /// and `path` when no explicit callback URL is set.
    #[must_use]
    pub fn callback_url(&self) -> String {
        self.callback_url.clone().unwrap_or_else(|| {
            let protocol = self.protocol.as_deref().unwrap_or("http://");
            format!("{protocol}{}{}", self.host, self.path)
        })
    }

    /// Returns the lifetime of tracked request IDs.
    ///
    /// An absent or zero setting falls back to [`DEFAULT_REQUEST_ID_EXPIRATION_MS`].
    #[must_use]
    pub fn request_id_expiration(&self) -> Duration {
        let ms = self
            .request_id_expiration_period_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REQUEST_ID_EXPIRATION_MS);
        Duration::from_millis(ms)
    }
}

/// Per-request configuration fragment.
///
/// Every field is optional; unset fields fall back to the base options when
/// applied with [`SamlOptions::overlay`]. The request ID lifetime is not part
/// of the overlay because it is bound to the shared replay store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SamlOptionsOverlay {
    pub issuer: Option<String>,
    pub entry_point: Option<String>,
    pub callback_url: Option<String>,
    pub path: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub cert: Option<String>,
    pub private_key: Option<String>,
    pub decryption_pvk: Option<String>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    pub identifier_format: Option<String>,
    pub want_assertions_signed: Option<bool>,
    pub accepted_clock_skew_ms: Option<i64>,
    pub audience: Option<String>,
    pub idp_issuer: Option<String>,
    pub authn_context: Option<Vec<String>>,
    pub disable_request_authn_context: Option<bool>,
    pub force_authn: Option<bool>,
    pub skip_request_compression: Option<bool>,
    pub authn_request_binding: Option<SamlBinding>,
    pub validate_in_response_to: Option<bool>,
    pub logout_url: Option<String>,
    pub logout_callback_url: Option<String>,
    pub additional_params: Option<BTreeMap<String, String>>,
    pub additional_authorize_params: Option<BTreeMap<String, String>>,
    pub additional_logout_params: Option<BTreeMap<String, String>>,
}

impl SamlOptionsOverlay {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service provider entity ID.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the identity provider SSO endpoint.
    #[must_use]
    pub fn entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Sets the assertion consumer URL.
    #[must_use]
    pub fn callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    /// Sets the identity provider certificate.
    #[must_use]
    pub fn cert(mut self, cert: impl Into<String>) -> Self {
        self.cert = Some(cert.into());
        self
    }

    /// Sets the identity provider logout endpoint.
    #[must_use]
    pub fn logout_url(mut self, logout_url: impl Into<String>) -> Self {
        self.logout_url = Some(logout_url.into());
        self
    }

    /// Returns true if the overlay sets no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn replace<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn replace_some<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected a boolean, got {other}"))),
    }
}
