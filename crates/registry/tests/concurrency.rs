//! Concurrent writers racing on the same logical key.
//!
//! Every registry handle here is a clone sharing one in-memory store, which
//! is equivalent to independent processes sharing a store: the registry
//! keeps no state of its own.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeSet;

use keyver_registry::{RegistryConfig, RegistryError};
use keyver_test_utils::{test_registry, test_registry_with, test_retry_policy};

const TASKS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_or_register_yields_single_v1() {
    let (registry, store) = test_registry();

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry.create_or_register("crypto", "BUY_VALUE", format!("value-{i}")).await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert!(results.iter().all(|r| r == &results[0]), "all callers see the same version");
    assert_eq!(results[0].number.value(), 1);
    assert_eq!(store.len(), 2, "exactly one version record and one pointer");

    let versions = registry.list_versions("crypto", "BUY_VALUE").await.unwrap();
    assert_eq!(versions.len(), 1);
    let active = registry.get_active_value("crypto", "BUY_VALUE").await.unwrap();
    assert_eq!(active.value, versions[0].value);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishes_have_unique_contiguous_numbers() {
    // Enough conflict budget that every publisher eventually wins a round.
    let config = RegistryConfig::builder()
        .with_retry_policy(test_retry_policy())
        .with_max_conflict_retries(TASKS as u32)
        .build()
        .unwrap();
    let (registry, _store) = test_registry_with(config);
    registry.create_or_register("crypto", "BUY_VALUE", "0").await.unwrap();

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .publish_new_version("crypto", "BUY_VALUE", format!("{}", i + 1), i % 2 == 0)
                    .await
            })
        })
        .collect();

    let mut numbers = BTreeSet::new();
    for handle in handles {
        let published = handle.await.unwrap().unwrap();
        assert!(numbers.insert(published.number.value()), "duplicate version number");
    }

    assert_eq!(numbers, (2..=TASKS as u64 + 1).collect::<BTreeSet<_>>());
    let listed: Vec<u64> = registry
        .list_versions("crypto", "BUY_VALUE")
        .await
        .unwrap()
        .iter()
        .map(|v| v.number.value())
        .collect();
    assert_eq!(listed, (1..=TASKS as u64 + 1).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishes_respect_conflict_budget() {
    let (registry, _store) = test_registry();
    registry.create_or_register("crypto", "BUY_VALUE", "0").await.unwrap();

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry.publish_new_version("crypto", "BUY_VALUE", format!("{i}"), true).await
            })
        })
        .collect();

    let mut successes = 0u64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(RegistryError::Conflict { attempts, .. }) => assert_eq!(attempts, 4),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // Whatever lost, the history has no gaps and the pointer names the newest
    // activated version.
    let versions = registry.list_versions("crypto", "BUY_VALUE").await.unwrap();
    let numbers: Vec<u64> = versions.iter().map(|v| v.number.value()).collect();
    assert_eq!(numbers, (1..=successes + 1).collect::<Vec<_>>());
    let active = registry.get_active_value("crypto", "BUY_VALUE").await.unwrap();
    assert_eq!(active.number.value(), successes + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_staged_publish_does_not_move_pointer_under_contention() {
    const STAGERS: usize = 4;
    let config = RegistryConfig::builder()
        .with_retry_policy(test_retry_policy())
        .with_max_conflict_retries(STAGERS as u32)
        .build()
        .unwrap();
    let (registry, _store) = test_registry_with(config);
    registry.create_or_register("crypto", "BUY_VALUE", "100").await.unwrap();

    let handles: Vec<_> = (0..STAGERS)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry.publish_new_version("crypto", "BUY_VALUE", format!("{i}"), false).await
            })
        })
        .collect();

    // Staged publishers never write the pointer, but still race on the
    // version number.
    let mut numbers = BTreeSet::new();
    for handle in handles {
        let staged = handle.await.unwrap().unwrap();
        assert!(!staged.active);
        assert!(numbers.insert(staged.number.value()), "duplicate version number");
    }
    assert_eq!(numbers, (2..=STAGERS as u64 + 1).collect::<BTreeSet<_>>());

    let listed: Vec<u64> = registry
        .list_versions("crypto", "BUY_VALUE")
        .await
        .unwrap()
        .iter()
        .map(|v| v.number.value())
        .collect();
    assert_eq!(listed, (1..=STAGERS as u64 + 1).collect::<Vec<_>>());

    let active = registry.get_active_value("crypto", "BUY_VALUE").await.unwrap();
    assert_eq!(active.number.value(), 1);
    assert_eq!(active.value_str(), Some("100"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_keys_do_not_interfere() {
    let (registry, store) = test_registry();

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                let key_name = format!("KEY_{i}");
                registry.create_or_register("crypto", &key_name, "1").await?;
                registry.publish_new_version("crypto", &key_name, "2", true).await
            })
        })
        .collect();

    for handle in handles {
        let published = handle.await.unwrap().unwrap();
        assert_eq!(published.number.value(), 2);
    }

    assert_eq!(registry.list_keys("crypto").await.unwrap().len(), TASKS);
    assert_eq!(store.len(), TASKS * 3);
}
