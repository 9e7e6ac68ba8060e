// tests/tier/http.rs
// HttpTier against a mock cache gateway.

use bytes::Bytes;
use retrieval_cache::tier::query_key;
use retrieval_cache::{
    DistributedCache, EngineBuilder, HttpTier, HttpTierConfig, QueryFingerprint, TierError,
};
use std::sync::Arc;
use std::time::Duration;

fn tier_for(server: &mockito::ServerGuard) -> HttpTier {
    HttpTier::new(HttpTierConfig {
        base_url: server.url(),
        api_key: None,
        timeout_ms: 1000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_hit_returns_body() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/cache/chunk:7")
        .with_status(200)
        .with_body(vec![0x82, 0x01, 0x02])
        .create_async()
        .await;

    let tier = tier_for(&server);
    let value = tier.get("chunk:7").await.unwrap();
    assert_eq!(value, Some(Bytes::from_static(&[0x82, 0x01, 0x02])));
}

#[tokio::test]
async fn test_get_miss_maps_404_to_none() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/cache/chunk:9")
        .with_status(404)
        .create_async()
        .await;

    let tier = tier_for(&server);
    assert_eq!(tier.get("chunk:9").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_server_error_is_reported() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/cache/chunk:1")
        .with_status(500)
        .create_async()
        .await;

    let tier = tier_for(&server);
    let err = tier.get("chunk:1").await.unwrap_err();
    assert!(matches!(err, TierError::NetworkError(_)));
}

#[tokio::test]
async fn test_set_sends_ttl_header_and_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("PUT", "/cache/chunk:4")
        .match_header("x-cache-ttl", "300")
        .match_body("payload")
        .with_status(204)
        .create_async()
        .await;

    let tier = tier_for(&server);
    tier.set(
        "chunk:4",
        Bytes::from_static(b"payload"),
        Duration::from_secs(300),
    )
    .await
    .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_requests_carry_bearer_token_when_configured() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/cache/chunk:2")
        .match_header("authorization", "Bearer cache-secret")
        .with_status(200)
        .with_body("x")
        .create_async()
        .await;

    let tier = HttpTier::new(HttpTierConfig {
        base_url: server.url(),
        api_key: Some("cache-secret".to_string()),
        timeout_ms: 1000,
    })
    .unwrap();

    assert!(tier.get("chunk:2").await.unwrap().is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_engine_search_reads_then_writes_gateway() {
    let mut server = mockito::Server::new_async().await;

    let query = vec![0.5f32; 8];
    let key = query_key(&QueryFingerprint::from_query(&query), 3);
    let path = format!("/cache/{}", key);

    let mock_get = server
        .mock("GET", path.as_str())
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let mock_put = server
        .mock("PUT", path.as_str())
        .match_header("x-cache-ttl", "300")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let engine = EngineBuilder::new()
        .embedding_dim(8)
        .distributed_cache(Arc::new(tier_for(&server)))
        .build()
        .unwrap();

    let (ids, metrics) = engine.search_context(&query, 3, true).await.unwrap();
    assert!(ids.is_empty());
    assert!(!metrics.distributed_hit);
    mock_get.assert_async().await;
    mock_put.assert_async().await;
}
