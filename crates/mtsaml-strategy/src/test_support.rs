//! In-crate test doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mtsaml_cache::ReplayStore;
use mtsaml_core::SamlOptions;
use serde_json::json;

use crate::engine::{
    EngineError, EngineFactory, EngineResult, Profile, ProtocolEngine, ValidatedMessage,
};
use crate::error::BoxError;
use crate::outcome::AuthenticateOptions;
use crate::request::SamlRequest;
use crate::verify::{verify_fn, Verify, VerifyOutcome};

/// Engine that echoes its options into everything it produces.
///
/// Message values are interpreted as: `bad` fails signature validation,
/// `logout` is a logout response, anything else is the subject name ID.
pub struct EchoEngine {
    pub options: SamlOptions,
}

impl EchoEngine {
    fn entry_point(&self) -> &str {
        self.options.entry_point.as_deref().unwrap_or("https://idp.invalid/sso")
    }

    fn response(&self, value: &str) -> EngineResult<ValidatedMessage> {
        match value {
            "bad" => Err(EngineError::SignatureInvalid("bad signature".to_string())),
            "logout" => Ok(ValidatedMessage::logout_response()),
            name_id => Ok(ValidatedMessage::login(
                Profile::new(name_id).with_issuer(self.options.issuer.clone()),
            )),
        }
    }
}

#[async_trait]
impl ProtocolEngine for EchoEngine {
    async fn validate_redirect(
        &self,
        query: &HashMap<String, String>,
        _original_query: &str,
    ) -> EngineResult<ValidatedMessage> {
        if let Some(name_id) = query.get("SAMLRequest") {
            return Ok(ValidatedMessage::logout_request(
                Profile::new(name_id.as_str()).with_issuer(self.options.issuer.clone()),
            ));
        }
        let value = query
            .get("SAMLResponse")
            .ok_or_else(|| EngineError::InvalidRequest("no message".to_string()))?;
        self.response(value)
    }

    async fn validate_post_response(
        &self,
        body: &HashMap<String, String>,
    ) -> EngineResult<ValidatedMessage> {
        let value = body
            .get("SAMLResponse")
            .ok_or_else(|| EngineError::InvalidResponse("no SAMLResponse".to_string()))?;
        self.response(value)
    }

    async fn validate_post_request(
        &self,
        body: &HashMap<String, String>,
    ) -> EngineResult<ValidatedMessage> {
        let name_id = body
            .get("SAMLRequest")
            .ok_or_else(|| EngineError::InvalidRequest("no SAMLRequest".to_string()))?;
        Ok(ValidatedMessage::logout_request(Profile::new(name_id.as_str())))
    }

    async fn authorize_url(
        &self,
        _request: &SamlRequest,
        options: &AuthenticateOptions,
    ) -> EngineResult<String> {
        let mut url = format!("{}?issuer={}", self.entry_point(), self.options.issuer);
        for (key, value) in &options.additional_params {
            url.push_str(&format!("&{key}={value}"));
        }
        Ok(url)
    }

    async fn authorize_form(&self, _request: &SamlRequest) -> EngineResult<String> {
        Ok(format!(
            "<form method=\"post\" action=\"{}\">{}</form>",
            self.entry_point(),
            self.options.issuer
        ))
    }

    async fn logout_url(
        &self,
        request: &SamlRequest,
        _options: &AuthenticateOptions,
    ) -> EngineResult<String> {
        let user = request
            .user
            .as_ref()
            .ok_or_else(|| EngineError::InvalidRequest("no logged-in user".to_string()))?;
        let target = self.options.logout_url.as_deref().unwrap_or(self.entry_point());
        Ok(format!("{target}?issuer={}&nameId={}", self.options.issuer, user.name_id))
    }

    async fn logout_response_url(
        &self,
        _request: &SamlRequest,
        logout_request: &Profile,
        _options: &AuthenticateOptions,
    ) -> EngineResult<String> {
        let target = self.options.logout_url.as_deref().unwrap_or(self.entry_point());
        Ok(format!("{target}?issuer={}&done={}", self.options.issuer, logout_request.name_id))
    }

    fn generate_service_provider_metadata(
        &self,
        decryption_cert: Option<&str>,
        signing_cert: Option<&str>,
    ) -> EngineResult<String> {
        Ok(format!(
            "<EntityDescriptor entityID=\"{}\" enc=\"{}\" sig=\"{}\"/>",
            self.options.issuer,
            decryption_cert.unwrap_or_default(),
            signing_cert.unwrap_or_default()
        ))
    }
}

/// Factory counting how many engines it built.
#[derive(Default)]
pub struct CountingFactory {
    pub calls: Arc<AtomicUsize>,
}

impl CountingFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EngineFactory for CountingFactory {
    fn create(
        &self,
        options: &SamlOptions,
        _replay_store: Arc<dyn ReplayStore>,
    ) -> EngineResult<Box<dyn ProtocolEngine>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(EchoEngine {
            options: options.clone(),
        }))
    }
}

/// Base options that pass validation on their own.
pub fn base_options() -> SamlOptions {
    SamlOptions {
        entry_point: Some("https://idp.example.com/sso".to_string()),
        cert: Some("BASE-CERT".to_string()),
        ..SamlOptions::default()
    }
}

/// Verify that accepts every subject except `nobody` and errors on `boom`.
pub fn echo_verify() -> Arc<dyn Verify> {
    Arc::new(verify_fn(|profile: Profile| async move {
        match profile.name_id.as_str() {
            "nobody" => Ok(VerifyOutcome::Fail {
                info: Some(json!({ "message": "unknown user" })),
            }),
            "boom" => Err::<_, BoxError>("directory unavailable".into()),
            _ => Ok(VerifyOutcome::Success {
                user: json!({ "id": profile.name_id }),
                info: profile.issuer.map(|issuer| json!({ "issuer": issuer })),
            }),
        }
    }))
}
