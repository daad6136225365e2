//! Integration tests for chain resolution and propagation.

mod common;

use std::sync::Arc;

use prometheus::Registry;

use chain_resource::chain::ChainResource;
use chain_resource::metrics::ChainMetrics;
use chain_resource::storage::{Storage, StorageError};

use common::{as_chain_input, CountingStorage};

#[tokio::test]
async fn test_first_hit_wins_and_writes_every_writable_tier_once() {
    let tiers = vec![
        Arc::new(CountingStorage::new("l1", None)),
        Arc::new(CountingStorage::new("l2", Some(5))),
        Arc::new(CountingStorage::new("l3", Some(99))),
        Arc::new(CountingStorage::new("remote", Some(123)).read_only()),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers)).unwrap();

    let resolved = chain.resolve().await.unwrap();
    assert_eq!(resolved.value, 5);
    assert_eq!(resolved.source_index, 1);
    assert_eq!(resolved.source, "l2");

    // Reads stop at the hit.
    assert_eq!(tiers[0].reads(), 1);
    assert_eq!(tiers[1].reads(), 1);
    assert_eq!(tiers[2].reads(), 0);
    assert_eq!(tiers[3].reads(), 0);

    // Every writable tier is written once, including the supplier.
    assert_eq!(tiers[0].writes(), 1);
    assert_eq!(tiers[1].writes(), 1);
    assert_eq!(tiers[2].writes(), 1);
    assert_eq!(tiers[3].writes(), 0);

    assert_eq!(tiers[2].stored().await, Some(5));
    assert_eq!(resolved.propagation.written, vec!["l1", "l2", "l3"]);
    assert!(resolved.propagation.is_complete());
}

#[tokio::test]
async fn test_all_absent_writes_nothing() {
    let tiers = vec![
        Arc::new(CountingStorage::new("l1", None)),
        Arc::new(CountingStorage::new("l2", None)),
        Arc::new(CountingStorage::new("remote", None).read_only()),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers)).unwrap();

    assert!(chain.get_value().await.is_none());
    for tier in &tiers {
        assert_eq!(tier.reads(), 1);
        assert_eq!(tier.writes(), 0);
    }
}

#[tokio::test]
async fn test_second_call_resolves_from_cheapest_tier() {
    let tiers = vec![
        Arc::new(CountingStorage::new("l1", None)),
        Arc::new(CountingStorage::new("remote", Some(77)).read_only()),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers)).unwrap();

    let first = chain.resolve().await.unwrap();
    let second = chain.resolve().await.unwrap();

    assert_eq!(first.value, 77);
    assert_eq!(second.value, 77);
    assert_eq!(first.source_index, 1);
    assert_eq!(second.source_index, 0);
    assert_eq!(tiers[1].reads(), 1);
}

#[tokio::test]
async fn test_failed_write_does_not_stop_propagation() {
    let tiers = vec![
        Arc::new(CountingStorage::new("l1", None).failing_writes()),
        Arc::new(CountingStorage::new("l2", None)),
        Arc::new(CountingStorage::new("remote", Some(8)).read_only()),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers)).unwrap();

    let resolved = chain.resolve().await.unwrap();
    assert_eq!(resolved.value, 8);
    assert_eq!(resolved.propagation.written, vec!["l2"]);
    assert_eq!(resolved.propagation.failed.len(), 1);
    assert_eq!(resolved.propagation.failed[0].0, "l1");
    assert!(!resolved.propagation.is_complete());

    assert_eq!(tiers[0].stored().await, None);
    assert_eq!(tiers[1].stored().await, Some(8));
}

#[tokio::test]
async fn test_read_error_falls_through() {
    let tiers = vec![
        Arc::new(CountingStorage::new("broken", Some(1)).failing_reads()),
        Arc::new(CountingStorage::new("l2", Some(2))),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers)).unwrap();

    let resolved = chain.resolve().await.unwrap();
    assert_eq!(resolved.value, 2);
    assert_eq!(resolved.source_index, 1);
    // The failing tier still receives the resolved value.
    assert_eq!(tiers[0].writes(), 1);
}

#[tokio::test]
async fn test_read_only_tier_rejects_direct_write() {
    let remote = CountingStorage::new("remote", Some(4)).read_only();

    let result = remote.write(&10).await;
    assert!(matches!(result, Err(StorageError::ReadOnly { ref tier }) if tier == "remote"));
    assert_eq!(remote.stored().await, Some(4));
}

#[tokio::test]
async fn test_propagate_skips_read_only_tiers() {
    let tiers = vec![
        Arc::new(CountingStorage::new("remote-a", None).read_only()),
        Arc::new(CountingStorage::new("l1", None)),
        Arc::new(CountingStorage::new("remote-b", None).read_only()),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers)).unwrap();

    let report = chain.propagate(&3).await;
    assert_eq!(report.written, vec!["l1"]);
    assert_eq!(tiers[0].writes(), 0);
    assert_eq!(tiers[2].writes(), 0);
}

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let registry = Registry::new();
    let metrics = ChainMetrics::new(&registry).unwrap();

    let tiers = vec![
        Arc::new(CountingStorage::new("l1", None).failing_writes()),
        Arc::new(CountingStorage::new("broken", None).failing_reads()),
        Arc::new(CountingStorage::new("remote", Some(6)).read_only()),
    ];
    let chain = ChainResource::new(as_chain_input(&tiers))
        .unwrap()
        .with_metrics(metrics.clone());

    chain.get_value().await.unwrap();

    assert_eq!(metrics.hits.with_label_values(&["remote"]).get(), 1);
    assert_eq!(metrics.read_errors.with_label_values(&["broken"]).get(), 1);
    assert_eq!(metrics.write_failures.with_label_values(&["l1"]).get(), 1);
    assert_eq!(metrics.misses.get(), 0);

    let empty = vec![Arc::new(CountingStorage::new("l1", None))];
    let chain = ChainResource::new(as_chain_input(&empty))
        .unwrap()
        .with_metrics(metrics.clone());
    assert!(chain.get_value().await.is_none());
    assert_eq!(metrics.misses.get(), 1);
}

#[tokio::test]
async fn test_concurrent_resolution_agrees() {
    let tiers = vec![
        Arc::new(CountingStorage::new("l1", None)),
        Arc::new(CountingStorage::new("remote", Some(42)).read_only()),
    ];
    let chain = Arc::new(ChainResource::new(as_chain_input(&tiers)).unwrap());

    let tasks = (0..16).map(|_| {
        let chain = chain.clone();
        tokio::spawn(async move { chain.get_value().await })
    });
    let results = futures::future::join_all(tasks).await;

    for result in results {
        assert_eq!(result.unwrap(), Some(42));
    }
    assert_eq!(tiers[0].stored().await, Some(42));
}
