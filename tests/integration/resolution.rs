//! Resolution behavior through the public API

use chrono::{TimeDelta, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vault::{
    provider_fn, Backend, Clock, Context, Entry, ManualClock, MemoryBackend, Namespaced, Provider,
    Vault, VaultError, MANUAL_SOURCE,
};

fn ctx() -> Context {
    Context::background()
}

/// Provider returning `entries` and counting how often it was asked
fn counting(calls: &Arc<AtomicUsize>, entries: Vec<Entry>) -> impl Provider + 'static {
    let calls = Arc::clone(calls);
    provider_fn(move |_ctx| {
        calls.fetch_add(1, Ordering::SeqCst);
        let entries = entries.clone();
        async move { Ok(entries) }
    })
}

fn failing(message: &'static str) -> impl Provider + 'static {
    provider_fn(move |_ctx| async move { Err(VaultError::Internal(message.to_string())) })
        .named("failing")
}

#[tokio::test]
async fn empty_vault_reports_not_found() {
    let vault = Vault::new();
    let err = vault.get(&ctx(), "x").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn set_then_get_returns_manual_entry() {
    let vault = Vault::new();
    vault.set(&ctx(), Entry::new("k", "v")).await.unwrap();

    let got = vault.get(&ctx(), "k").await.unwrap();
    assert_eq!(got.value, "v");
    assert_eq!(got.source, MANUAL_SOURCE);
    assert!(got.created_at.is_some());
}

#[tokio::test]
async fn set_preserves_explicit_values() {
    let vault = Vault::new();
    let ts = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    vault
        .set(
            &ctx(),
            Entry::new("k", "v").with_source("custom").with_created_at(ts),
        )
        .await
        .unwrap();

    let got = vault.get(&ctx(), "k").await.unwrap();
    assert_eq!(got.source, "custom");
    assert_eq!(got.created_at, Some(ts));
}

#[tokio::test]
async fn stale_entry_is_replaced_from_provider() {
    let store = MemoryBackend::new();
    store
        .set(
            &ctx(),
            &Entry::new("stale", "old")
                .with_source("seed")
                .with_created_at(Utc::now() - TimeDelta::hours(1)),
        )
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Vault::builder()
        .backend(store)
        .provider(counting(
            &calls,
            vec![Entry::new("stale", "fresh").with_source("mock")],
        ))
        .ttl(Duration::from_millis(1))
        .build();

    let got = vault.get(&ctx(), "stale").await.unwrap();
    assert_eq!(got.value, "fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_refresh_leaves_backend_unchanged() {
    let store = MemoryBackend::new();
    store.set(&ctx(), &Entry::new("seed", "1")).await.unwrap();

    let vault = Vault::builder()
        .backend(store.clone())
        .provider(failing("upstream down"))
        .build();

    let err = vault.refresh(&ctx()).await.unwrap_err();
    match &err {
        VaultError::Provider { provider, source } => {
            assert_eq!(provider, "failing");
            assert!(source.to_string().contains("upstream down"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("refresh"));

    let entries = store.list(&ctx()).await.unwrap();
    assert_eq!(entries, vec![Entry::new("seed", "1")]);
    assert!(vault.last_refresh().is_none());
}

#[tokio::test]
async fn freshness_boundary_follows_ttl() {
    let clock = Arc::new(ManualClock::default());
    let store = MemoryBackend::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Vault::builder()
        .backend(store.clone())
        .provider(counting(&calls, vec![]))
        .ttl(Duration::from_secs(60))
        .clock(clock.clone())
        .build();

    // Exactly at the TTL: still fresh, providers untouched.
    store
        .set(&ctx(), &Entry::new("k", "v").with_created_at(clock.now() - TimeDelta::seconds(60)))
        .await
        .unwrap();
    assert_eq!(vault.get(&ctx(), "k").await.unwrap().value, "v");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // One second past: stale, so a refresh runs. The provider has nothing
    // for this key and the re-read returns what the backend still holds.
    clock.advance(TimeDelta::seconds(1));
    assert_eq!(vault.get(&ctx(), "k").await.unwrap().value, "v");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_ttl_never_expires() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = MemoryBackend::new();
    store
        .set(
            &ctx(),
            &Entry::new("old", "still-good").with_created_at(Utc::now() - TimeDelta::days(3650)),
        )
        .await
        .unwrap();

    let vault = Vault::builder()
        .backend(store)
        .provider(counting(&calls, vec![]))
        .build();

    assert_eq!(vault.get(&ctx(), "old").await.unwrap().value, "still-good");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn namespaces_isolate_vaults_over_one_backend() {
    let shared = MemoryBackend::new();
    let a = Vault::builder().backend(shared.clone()).namespace("a").build();
    let b = Vault::builder().backend(shared.clone()).namespace("b").build();
    let root = Vault::builder().backend(shared.clone()).build();

    a.set(&ctx(), Entry::new("k", "from-a")).await.unwrap();

    assert_eq!(a.get(&ctx(), "k").await.unwrap().value, "from-a");
    assert!(b.get(&ctx(), "k").await.unwrap_err().is_not_found());
    assert!(root.get(&ctx(), "k").await.unwrap_err().is_not_found());

    // Same physical storage.
    let direct = shared.with_namespace("a");
    assert_eq!(direct.get(&ctx(), "k").await.unwrap().value, "from-a");
}

#[tokio::test]
async fn without_ttl_refresh_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Vault::builder()
        .provider(counting(&calls, vec![Entry::new("known", "v")]))
        .build();

    for i in 0..10 {
        let err = vault.get(&ctx(), &format!("missing-{i}")).await.unwrap_err();
        assert!(err.is_not_found());
    }
    assert_eq!(vault.get(&ctx(), "known").await.unwrap().value, "v");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Explicit refresh is never throttled.
    vault.refresh(&ctx()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn with_ttl_refresh_reruns_after_period() {
    let clock = Arc::new(ManualClock::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Vault::builder()
        .provider(counting(&calls, vec![]))
        .ttl(Duration::from_secs(60))
        .clock(clock.clone())
        .build();

    assert!(vault.get(&ctx(), "x").await.unwrap_err().is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(TimeDelta::seconds(30));
    assert!(vault.get(&ctx(), "x").await.unwrap_err().is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(TimeDelta::seconds(31));
    assert!(vault.get(&ctx(), "x").await.unwrap_err().is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stale_entry_is_not_served_while_throttled() {
    let clock = Arc::new(ManualClock::default());
    let store = MemoryBackend::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Vault::builder()
        .backend(store.clone())
        .provider(counting(&calls, vec![]))
        .ttl(Duration::from_secs(60))
        .clock(clock.clone())
        .build();

    vault.refresh(&ctx()).await.unwrap();
    store
        .set(&ctx(), &Entry::new("k", "old").with_created_at(clock.now() - TimeDelta::minutes(5)))
        .await
        .unwrap();

    assert!(vault.get(&ctx(), "k").await.unwrap_err().is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Still physically present: expiry never deletes.
    assert_eq!(vault.list(&ctx()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn later_provider_wins_on_collision() {
    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Vault::builder()
        .provider(counting(&calls, vec![Entry::new("k", "from-a").with_source("a")]))
        .provider(counting(&calls, vec![Entry::new("k", "from-b").with_source("b")]))
        .build();

    vault.refresh(&ctx()).await.unwrap();

    let got = vault.get(&ctx(), "k").await.unwrap();
    assert_eq!(got.value, "from-b");
    assert_eq!(got.source, "b");
}

#[tokio::test]
async fn partial_refresh_keeps_earlier_writes() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let third_calls = Arc::new(AtomicUsize::new(0));
    let store = MemoryBackend::new();
    let vault = Vault::builder()
        .backend(store.clone())
        .provider(counting(&first_calls, vec![Entry::new("first", "1")]))
        .provider(failing("second is down"))
        .provider(counting(&third_calls, vec![Entry::new("third", "3")]))
        .build();

    assert!(vault.refresh(&ctx()).await.is_err());

    assert!(vault.last_refresh().is_none());
    assert_eq!(store.get(&ctx(), "first").await.unwrap().value, "1");
    assert!(store.get(&ctx(), "third").await.unwrap_err().is_not_found());
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_surfaces_refresh_failure() {
    let store = MemoryBackend::new();
    store
        .set(
            &ctx(),
            &Entry::new("k", "old").with_created_at(Utc::now() - TimeDelta::hours(1)),
        )
        .await
        .unwrap();

    let vault = Vault::builder()
        .backend(store)
        .provider(failing("offline"))
        .ttl(Duration::from_secs(1))
        .build();

    let err = vault.get(&ctx(), "k").await.unwrap_err();
    assert!(matches!(err, VaultError::Provider { .. }));
}

#[tokio::test]
async fn cancellation_reaches_providers() {
    let vault = Vault::builder()
        .provider(provider_fn(|ctx: Context| async move {
            ctx.run("slow fetch", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<Vec<Entry>, VaultError>(vec![])
            })
            .await
        }))
        .build();

    let ctx = Context::background().with_timeout(Duration::from_millis(20));
    let err = vault.get(&ctx, "k").await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(vault.last_refresh().is_none());
}

#[tokio::test]
async fn concurrent_gets_all_resolve() {
    let calls = Arc::new(AtomicUsize::new(0));
    let vault = Arc::new(
        Vault::builder()
            .provider(counting(&calls, vec![Entry::new("shared", "v")]))
            .build(),
    );

    let mut handles = vec![];
    for _ in 0..16 {
        let vault = Arc::clone(&vault);
        handles.push(tokio::spawn(async move {
            vault.get(&Context::background(), "shared").await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().value, "v");
    }
    // Overlapping first-time refreshes are allowed, but at least one ran.
    assert!(calls.load(Ordering::SeqCst) >= 1);
}
