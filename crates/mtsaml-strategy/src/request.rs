//! Framework-neutral request view.

use std::collections::HashMap;

use crate::engine::Profile;

/// The parts of an HTTP request a SAML strategy reads.
///
/// Framework adapters build one of these per incoming request. Header names
/// are stored lowercased.
#[derive(Debug, Clone, Default)]
pub struct SamlRequest {
    /// HTTP method.
    pub method: String,
    /// Request path and query string, as received.
    pub url: String,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    /// Decoded form body parameters.
    pub body: HashMap<String, String>,
    /// Profile of the currently logged-in user, if any.
    pub user: Option<Profile>,
    headers: HashMap<String, String>,
}

impl SamlRequest {
    /// Creates a request, decoding the query string of `url`.
    #[must_use]
    pub fn from_url(method: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let query = url
            .split_once('?')
            .map(|(_, q)| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Self {
            method: method.into(),
            url,
            query,
            ..Self::default()
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::from_url("GET", url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::from_url("POST", url)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Adds a form body parameter.
    #[must_use]
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    /// Sets the logged-in user.
    #[must_use]
    pub fn with_user(mut self, user: Profile) -> Self {
        self.user = Some(user);
        self
    }

    /// Gets a header value (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Gets a query parameter.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Gets a body parameter.
    #[must_use]
    pub fn body_param(&self, key: &str) -> Option<&str> {
        self.body.get(key).map(String::as_str)
    }

    /// Returns the raw, undecoded query string (empty if there is none).
    #[must_use]
    pub fn original_query(&self) -> &str {
        self.url.split_once('?').map_or("", |(_, q)| q)
    }
}
