//! Request ID tracking through the shared replay store.

use std::time::Duration;

use mtsaml_strategy::{
    AuthOutcome, AuthenticateOptions, EngineError, SamlOptions, SamlRequest, Strategy,
    StrategyError,
};

use crate::common::{
    build_strategy_with, tenant_overlay, tenant_request, MockFactory, ScriptedResolver,
};

fn request_id(outcome: &AuthOutcome) -> anyhow::Result<String> {
    let url = outcome
        .redirect_url()
        .ok_or_else(|| anyhow::anyhow!("expected redirect, got {outcome:?}"))?;
    let (_, id) = url
        .split_once("ID=")
        .ok_or_else(|| anyhow::anyhow!("redirect carries no request ID: {url}"))?;
    Ok(id.to_string())
}

fn response(tenant: &str, in_response_to: &str) -> SamlRequest {
    SamlRequest::post("/saml/consume")
        .with_header("tenant", tenant)
        .with_form("SAMLResponse", "alice")
        .with_form("InResponseTo", in_response_to)
}

#[tokio::test]
async fn test_response_is_accepted_once() -> anyhow::Result<()> {
    let options = SamlOptions {
        validate_in_response_to: true,
        ..SamlOptions::default()
    };
    let resolver =
        ScriptedResolver::new().tenant("a", tenant_overlay("tenant-a", "A"), Duration::ZERO);
    let strategy = build_strategy_with(options, resolver, MockFactory::default())?;
    let auth = AuthenticateOptions::default();

    let login = strategy.authenticate(&tenant_request("a", "/login"), &auth).await;
    let id = request_id(&login)?;
    assert!(strategy.base().replay_store().get(&id).await?.is_some());

    let first = strategy.authenticate(&response("a", &id), &auth).await;
    assert!(first.is_success(), "first response must be accepted: {first:?}");

    let replayed = strategy.authenticate(&response("a", &id), &auth).await;
    match replayed.error() {
        Some(err) if matches!(err, StrategyError::Engine(EngineError::InvalidInResponseTo(_))) => {
            assert_eq!(err.http_status(), 401);
        }
        _ => anyhow::bail!("replayed response must be rejected, got {replayed:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_unknown_request_id_is_rejected() -> anyhow::Result<()> {
    let options = SamlOptions {
        validate_in_response_to: true,
        ..SamlOptions::default()
    };
    let resolver =
        ScriptedResolver::new().tenant("a", tenant_overlay("tenant-a", "A"), Duration::ZERO);
    let strategy = build_strategy_with(options, resolver, MockFactory::default())?;

    let outcome = strategy
        .authenticate(&response("a", "_never-issued"), &AuthenticateOptions::default())
        .await;

    assert!(outcome.is_error(), "unexpected outcome: {outcome:?}");
    Ok(())
}
