//! Integration tests for the account consistency cache.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{config, CountingReader, FakeTransport};
use cosmos_client::clients::Transport;
use cosmos_client::consistency::{AccountMetadataReader, ConsistencyCache};
use cosmos_client::models::ConsistencyLevel;
use cosmos_client::{Collaborators, CosmosClient, CosmosError};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn client_with_reader(reader: &Arc<CountingReader>) -> CosmosClient {
    CosmosClient::with_collaborators(
        config(),
        Collaborators {
            transport: Some(FakeTransport::new() as Arc<dyn Transport>),
            account_reader: Some(Arc::clone(reader) as Arc<dyn AccountMetadataReader>),
            ..Collaborators::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_sequential_calls_fetch_once() {
    let reader = CountingReader::new(ConsistencyLevel::Eventual);
    let client = client_with_reader(&reader);
    let cancel = CancellationToken::new();

    for _ in 0..5 {
        let level = client.account_consistency_level(&cancel).await.unwrap();
        assert_eq!(level, ConsistencyLevel::Eventual);
    }

    assert_eq!(reader.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_callers_share_one_fetch() {
    let reader = CountingReader::new(ConsistencyLevel::BoundedStaleness);
    let client = client_with_reader(&reader);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .account_consistency_level(&CancellationToken::new())
                    .await
            })
        })
        .collect();

    for task in tasks {
        let level = task.await.unwrap().unwrap();
        assert_eq!(level, ConsistencyLevel::BoundedStaleness);
    }

    assert_eq!(reader.calls(), 1);
}

#[tokio::test]
async fn test_failed_fetch_is_retried_on_next_call() {
    let reader = CountingReader::failing(ConsistencyLevel::Strong, 1);
    let cache = ConsistencyCache::new(Arc::clone(&reader) as Arc<dyn AccountMetadataReader>);
    let cancel = CancellationToken::new();

    assert!(cache.account_consistency_level(&cancel).await.is_err());
    assert!(cache.cached().is_none());

    let level = cache.account_consistency_level(&cancel).await.unwrap();
    assert_eq!(level, ConsistencyLevel::Strong);
    assert_eq!(reader.calls(), 2);
}

#[tokio::test]
async fn test_cancelled_fetch_is_not_cached() {
    let reader = CountingReader::new(ConsistencyLevel::Session);
    let cache = ConsistencyCache::new(Arc::clone(&reader) as Arc<dyn AccountMetadataReader>);

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let result = cache.account_consistency_level(&cancelled).await;
    assert!(matches!(result, Err(CosmosError::Cancelled)));
    assert!(cache.cached().is_none());

    let level = cache
        .account_consistency_level(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(level, ConsistencyLevel::Session);
    assert_eq!(cache.cached().unwrap().max_staleness_prefix, 100);
}

#[tokio::test]
async fn test_waiting_caller_honors_its_own_cancellation() {
    let reader = CountingReader::slow(ConsistencyLevel::Session, Duration::from_millis(1500));
    let cache = Arc::new(ConsistencyCache::new(
        Arc::clone(&reader) as Arc<dyn AccountMetadataReader>
    ));

    let fetching = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            cache
                .account_consistency_level(&CancellationToken::new())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = cache.account_consistency_level(&cancel).await;
    assert!(matches!(result, Err(CosmosError::Cancelled)));
    assert!(started.elapsed() < Duration::from_millis(1000));

    let level = fetching.await.unwrap().unwrap();
    assert_eq!(level, ConsistencyLevel::Session);
    assert_eq!(reader.calls(), 1);
    assert!(cache.cached().is_some());
}

#[tokio::test]
async fn test_default_reader_goes_through_the_chain() {
    let transport = FakeTransport::new();
    transport.push(
        200,
        json!({
            "id": "acct",
            "userConsistencyPolicy": {"defaultConsistencyLevel": "ConsistentPrefix"}
        }),
    );
    let client = common::client_with(&transport);
    let cancel = CancellationToken::new();

    assert_eq!(
        client.account_consistency_level(&cancel).await.unwrap(),
        ConsistencyLevel::ConsistentPrefix
    );
    assert_eq!(
        client.account_consistency_level(&cancel).await.unwrap(),
        ConsistencyLevel::ConsistentPrefix
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "");
    assert!(requests[0].header("authorization").is_some());
}
