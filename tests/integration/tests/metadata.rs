//! Service provider metadata per tenant.

use std::sync::atomic::Ordering;
use std::time::Duration;

use mtsaml_strategy::{StrategyError, StrategyResult};
use tokio::sync::oneshot;

use crate::common::{build_strategy, tenant_overlay, tenant_request, MockFactory, ScriptedResolver};

#[tokio::test]
async fn test_metadata_without_callback_is_rejected_synchronously() -> anyhow::Result<()> {
    let resolver =
        ScriptedResolver::new().tenant("a", tenant_overlay("tenant-a", "A"), Duration::ZERO);
    let resolver_calls = resolver.calls();
    let factory = MockFactory::default();
    let strategy = build_strategy(resolver, factory.clone())?;

    let result = strategy.generate_service_provider_metadata_with(
        tenant_request("a", "/metadata"),
        None,
        None,
        None::<fn(StrategyResult<String>)>,
    );

    match result {
        Err(err @ StrategyError::InvalidUsage(_)) => {
            assert_eq!(
                err.to_string(),
                "invalid usage: Metadata can't be provided synchronously for MultiSamlStrategy."
            );
        }
        other => anyhow::bail!("expected invalid usage, got {other:?}"),
    }
    assert_eq!(resolver_calls.load(Ordering::SeqCst), 0);
    assert_eq!(factory.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_metadata_callback_receives_tenant_document() -> anyhow::Result<()> {
    let resolver = ScriptedResolver::new()
        .tenant("a", tenant_overlay("tenant-a", "A"), Duration::from_millis(5));
    let strategy = build_strategy(resolver, MockFactory::default())?;

    let (tx, rx) = oneshot::channel();
    let task = strategy.generate_service_provider_metadata_with(
        tenant_request("a", "/metadata"),
        None,
        Some("SIGNING".to_string()),
        Some(move |result: StrategyResult<String>| {
            let _ = tx.send(result);
        }),
    )?;
    task.await?;

    let xml = rx.await??;
    assert_eq!(xml, "<EntityDescriptor entityID=\"tenant-a\" cert=\"A\" signing=\"SIGNING\"/>");

    Ok(())
}

#[test]
fn test_metadata_callback_needs_runtime() -> anyhow::Result<()> {
    let resolver = ScriptedResolver::new();
    let resolver_calls = resolver.calls();
    let strategy = build_strategy(resolver, MockFactory::default())?;

    let result = strategy.generate_service_provider_metadata_with(
        tenant_request("a", "/metadata"),
        None,
        None,
        Some(|_: StrategyResult<String>| {}),
    );

    assert!(matches!(result, Err(StrategyError::InvalidUsage(_))));
    assert_eq!(resolver_calls.load(Ordering::SeqCst), 0);

    Ok(())
}
