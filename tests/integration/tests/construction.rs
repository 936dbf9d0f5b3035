//! Strategy construction and defaults.

use std::sync::Arc;
use std::time::Duration;

use mtsaml_strategy::{
    verify_fn, BoxError, InMemoryReplayStore, MultiSamlStrategy, Profile, ReplayStore,
    SamlOptions, StrategyError, VerifyOutcome,
};

use crate::common::{build_strategy, build_strategy_with, MockFactory, ScriptedResolver};

#[test]
fn test_missing_resolver_fails_before_any_request() {
    let factory = MockFactory::default();
    let result = MultiSamlStrategy::builder()
        .factory(factory.clone())
        .verify(verify_fn(|_: Profile| async {
            Ok::<_, BoxError>(VerifyOutcome::fail())
        }))
        .build();

    match result {
        Err(StrategyError::Configuration(message)) => {
            assert!(message.contains("config resolver"), "unexpected message: {message}");
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
    assert_eq!(factory.calls(), 0);
}

#[test]
fn test_default_expiration_wires_default_store() -> anyhow::Result<()> {
    let strategy = build_strategy(ScriptedResolver::new(), MockFactory::default())?;

    assert_eq!(strategy.base().request_id_expiration_period_ms(), 28_800_000);
    assert_eq!(
        strategy.base().options().request_id_expiration_period_ms,
        Some(28_800_000)
    );

    let store = strategy
        .base()
        .replay_store()
        .as_any()
        .downcast_ref::<InMemoryReplayStore>()
        .ok_or_else(|| anyhow::anyhow!("default store should be in-memory"))?;
    assert_eq!(store.key_expiration(), Duration::from_millis(28_800_000));

    Ok(())
}

#[test]
fn test_zero_expiration_falls_back_to_default() -> anyhow::Result<()> {
    let options = SamlOptions {
        request_id_expiration_period_ms: Some(0),
        ..SamlOptions::default()
    };
    let strategy = build_strategy_with(options, ScriptedResolver::new(), MockFactory::default())?;

    assert_eq!(strategy.base().request_id_expiration(), Duration::from_secs(8 * 60 * 60));

    Ok(())
}

#[test]
fn test_explicit_expiration_sizes_default_store() -> anyhow::Result<()> {
    let options = SamlOptions {
        request_id_expiration_period_ms: Some(120_000),
        ..SamlOptions::default()
    };
    let strategy = build_strategy_with(options, ScriptedResolver::new(), MockFactory::default())?;

    let store = strategy
        .base()
        .replay_store()
        .as_any()
        .downcast_ref::<InMemoryReplayStore>()
        .ok_or_else(|| anyhow::anyhow!("default store should be in-memory"))?;
    assert_eq!(store.key_expiration(), Duration::from_secs(120));

    Ok(())
}

#[test]
fn test_supplied_store_is_kept() -> anyhow::Result<()> {
    let store: Arc<dyn ReplayStore> = Arc::new(InMemoryReplayStore::new(Duration::from_secs(5)));

    let strategy = MultiSamlStrategy::builder()
        .resolver(ScriptedResolver::new())
        .factory(MockFactory::default())
        .verify(verify_fn(|_: Profile| async {
            Ok::<_, BoxError>(VerifyOutcome::fail())
        }))
        .replay_store(Arc::clone(&store))
        .build()?;

    assert!(Arc::ptr_eq(strategy.base().replay_store(), &store));
    assert_eq!(strategy.base().request_id_expiration_period_ms(), 28_800_000);

    Ok(())
}
