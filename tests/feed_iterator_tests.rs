//! Integration tests for continuation-driven paging.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{client_with, FakeTransport};
use cosmos_client::clients::{headers, OperationKind, RawResponse, RequestMessage, Transport};
use cosmos_client::feed::FeedState;
use cosmos_client::{Collaborators, CosmosClient, CosmosError, FeedOptions, QueryDefinition, UsageFault};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize, PartialEq)]
struct Doc {
    id: String,
}

#[tokio::test]
async fn test_pages_follow_continuation_until_exhausted() {
    let transport = FakeTransport::new();
    transport.push_with_headers(
        200,
        &[(headers::CONTINUATION, "c1")],
        Some(json!({"Documents": [{"id": "a"}, {"id": "b"}], "_count": 2})),
    );
    transport.push(200, json!({"Documents": [{"id": "c"}], "_count": 1}));
    let client = client_with(&transport);
    let cancel = CancellationToken::new();

    let mut feed = client
        .database("shop")
        .container("orders")
        .read_items::<Doc>(FeedOptions {
            max_item_count: Some(2),
            ..FeedOptions::default()
        })
        .unwrap();

    let mut ids = Vec::new();
    while feed.has_more_results() {
        let page = feed.read_next(&cancel).await.unwrap();
        ids.extend(page.into_inner().into_iter().map(|d| d.id));
    }

    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(feed.cursor().state(), FeedState::Exhausted);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].operation, OperationKind::ReadFeed);
    assert_eq!(requests[0].path, "dbs/shop/colls/orders/docs");
    assert!(requests[0].header(headers::CONTINUATION).is_none());
    assert_eq!(requests[0].header(headers::MAX_ITEM_COUNT), Some("2"));
    assert_eq!(requests[1].header(headers::CONTINUATION), Some("c1"));
}

#[tokio::test]
async fn test_read_after_exhaustion_is_a_usage_fault() {
    let transport = FakeTransport::new();
    transport.push(200, json!({"Documents": [], "_count": 0}));
    let client = client_with(&transport);
    let cancel = CancellationToken::new();

    let mut feed = client
        .database("shop")
        .container("orders")
        .read_items::<Doc>(FeedOptions::default())
        .unwrap();
    let page = feed.read_next(&cancel).await.unwrap();
    assert!(page.is_empty());
    assert!(!feed.has_more_results());

    let result = feed.read_next(&cancel).await;
    assert!(matches!(result, Err(CosmosError::Usage(UsageFault::FeedExhausted))));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_empty_body_is_an_empty_page() {
    let transport = FakeTransport::new();
    transport.push_empty(200);
    let client = client_with(&transport);

    let mut feed = client.read_databases(FeedOptions::default());
    let page = feed.read_next(&CancellationToken::new()).await.unwrap();

    assert_eq!(page.count(), 0);
    assert!(page.continuation().is_none());
    assert!(!feed.has_more_results());
}

#[tokio::test]
async fn test_failed_page_does_not_advance_cursor() {
    let transport = FakeTransport::new();
    transport.push_with_headers(
        200,
        &[(headers::CONTINUATION, "c1")],
        Some(json!({"Documents": [{"id": "a"}]})),
    );
    transport.push(503, json!({"code": "ServiceUnavailable"}));
    transport.push(200, json!({"Documents": [{"id": "b"}]}));
    let client = client_with(&transport);
    let cancel = CancellationToken::new();

    let mut feed = client
        .database("shop")
        .container("orders")
        .read_items::<Doc>(FeedOptions::default())
        .unwrap();

    feed.read_next(&cancel).await.unwrap();
    let error = feed.read_next(&cancel).await.unwrap_err();
    assert_eq!(error.status(), Some(503));
    assert!(feed.has_more_results());
    assert_eq!(feed.cursor().continuation(), Some("c1"));

    let page = feed.read_next(&cancel).await.unwrap();
    assert_eq!(page[0].id, "b");

    let requests = transport.requests();
    assert_eq!(requests[1].header(headers::CONTINUATION), Some("c1"));
    assert_eq!(requests[2].header(headers::CONTINUATION), Some("c1"));
    assert_eq!(transport.released(), 3);
}

#[tokio::test]
async fn test_query_sets_query_headers_and_body() {
    let transport = FakeTransport::new();
    transport.push_with_headers(
        200,
        &[(headers::QUERY_METRICS, "totalExecutionTimeInMs=1.5")],
        Some(json!({"Documents": [{"id": "a"}]})),
    );
    let client = client_with(&transport);

    let query = QueryDefinition::new("SELECT * FROM c WHERE c.total > @min").with_parameter("@min", 10);
    let mut feed = client
        .database("shop")
        .container("orders")
        .query_items::<Doc>(
            query,
            FeedOptions {
                enable_cross_partition_query: true,
                ..FeedOptions::default()
            },
        )
        .unwrap();
    let page = feed.read_next(&CancellationToken::new()).await.unwrap();

    assert_eq!(page.count(), 1);
    assert!(page.query_metadata().is_some());

    let request = &transport.requests()[0];
    assert_eq!(request.operation, OperationKind::Query);
    assert_eq!(request.header(headers::IS_QUERY), Some("true"));
    assert_eq!(request.header(headers::CONTENT_TYPE), Some(headers::APPLICATION_QUERY_JSON));
    assert_eq!(request.header(headers::ENABLE_CROSS_PARTITION_QUERY), Some("true"));
    let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
    assert_eq!(body["query"], "SELECT * FROM c WHERE c.total > @min");
    assert_eq!(body["parameters"][0]["name"], "@min");
}

#[tokio::test]
async fn test_cancelled_read_sends_nothing_and_keeps_cursor() {
    let transport = FakeTransport::new();
    let client = client_with(&transport);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut feed = client.read_databases(FeedOptions {
        continuation: Some("resume-here".to_string()),
        ..FeedOptions::default()
    });
    let result = feed.read_next(&cancel).await;

    assert!(matches!(result, Err(CosmosError::Cancelled)));
    assert!(feed.has_more_results());
    assert_eq!(feed.cursor().continuation(), Some("resume-here"));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_missing_envelope_is_a_serialization_error() {
    let transport = FakeTransport::new();
    transport.push(200, json!({"Items": []}));
    let client = client_with(&transport);

    let mut feed = client.read_databases(FeedOptions::default());
    let result = feed.read_next(&CancellationToken::new()).await;

    assert!(matches!(result, Err(CosmosError::Serialization(_))));
    assert!(feed.has_more_results());
}

/// A caller-supplied transport that answers every request with the same
/// query page and never tags the response itself.
#[derive(Debug)]
struct PlainQueryTransport;

#[async_trait]
impl Transport for PlainQueryTransport {
    async fn send(&self, _request: RequestMessage) -> Result<RawResponse, CosmosError> {
        let mut response_headers = HashMap::new();
        response_headers.insert(
            headers::QUERY_METRICS.to_string(),
            vec!["totalExecutionTimeInMs=0.7".to_string()],
        );
        Ok(RawResponse::new(
            200,
            "OK",
            response_headers,
            Some(br#"{"Documents":[{"id":"a"}]}"#.to_vec()),
        ))
    }
}

#[tokio::test]
async fn test_custom_transport_query_pages_carry_query_metadata() {
    let client = CosmosClient::with_collaborators(
        common::config(),
        Collaborators {
            transport: Some(Arc::new(PlainQueryTransport) as Arc<dyn Transport>),
            ..Collaborators::default()
        },
    )
    .unwrap();

    let mut feed = client
        .database("shop")
        .container("orders")
        .query_items::<Doc>(QueryDefinition::new("SELECT * FROM c"), FeedOptions::default())
        .unwrap();
    let page = feed.read_next(&CancellationToken::new()).await.unwrap();

    assert_eq!(page.count(), 1);
    assert_eq!(
        page.query_metadata().and_then(|m| m.query_metrics.as_deref()),
        Some("totalExecutionTimeInMs=0.7")
    );
}
