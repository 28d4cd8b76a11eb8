use super::*;
use crate::auth::StaticCredentials;
use crate::error::Error;
use crate::query::Query;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_query() -> Query {
    Query::parse("search publications return publications").unwrap()
}

/// Backoff shortened so throttle tests run in milliseconds
fn fast_rate_limit() -> RateLimiterConfig {
    RateLimiterConfig {
        backoff_base: Duration::from_millis(10),
        backoff_cap: Duration::from_millis(80),
        ..RateLimiterConfig::default()
    }
}

fn client_for(server: &MockServer) -> DslClient {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .rate_limit(fast_rate_limit())
        .network_retries(0, Duration::ZERO)
        .build();
    DslClient::new(config, Arc::new(StaticCredentials::token("test-token"))).unwrap()
}

fn page_body(total: u64, ids: &[&str]) -> serde_json::Value {
    let items: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "_stats": { "total_count": total }, "publications": items })
}

#[tokio::test]
async fn test_fetch_page_sends_auth_and_window() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .and(header("authorization", "JWT test-token"))
        .and(body_string_contains(
            "search publications return publications limit 1000 skip 0",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, &["pub.1", "pub.2"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.fetch_page(&test_query(), 0, 1000).await.unwrap();

    assert_eq!(page.total_count, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].get("id"), Some(&json!("pub.1")));
}

#[tokio::test]
async fn test_fetch_page_hits_cache_on_repeat() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, &["pub.1"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.fetch_page(&test_query(), 0, 1000).await.unwrap();
    let second = client.fetch_page(&test_query(), 0, 1000).await.unwrap();

    assert_eq!(first.items, second.items);
    let stats = client.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_throttle_retried_transparently() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, &["pub.1"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.fetch_page(&test_query(), 0, 1000).await.unwrap();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_persistent_throttle_surfaces_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .rate_limit(fast_rate_limit())
        .throttle_retries(1)
        .build();
    let client =
        DslClient::new(config, Arc::new(StaticCredentials::token("test-token"))).unwrap();

    let err = client.fetch_page(&test_query(), 0, 1000).await.unwrap_err();
    match err {
        Error::Throttled {
            retry_after_seconds,
        } => assert_eq!(retry_after_seconds, Some(1)),
        other => panic!("expected Throttled, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_rejection_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_page(&test_query(), 0, 1000).await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_server_error_surfaced_immediately() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_page(&test_query(), 0, 1000).await.unwrap_err();
    match err {
        Error::Server { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

#[tokio::test]
async fn test_quota_headers_ingested() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dsl.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "7")
                .insert_header("x-ratelimit-reset", "42")
                .set_body_json(page_body(1, &["pub.1"])),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch_page(&test_query(), 0, 1000).await.unwrap();
    assert_eq!(client.rate_limiter().remaining_quota(), Some(7));
}

#[tokio::test]
async fn test_rejects_malformed_base_url() {
    let config = ClientConfig::builder().base_url("not a url").build();
    let result = DslClient::new(config, Arc::new(StaticCredentials::token("t")));
    assert!(result.is_err());
}

mod rate_limiter {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_quota() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.max_calls, 30);
        assert_eq!(config.period, Duration::from_secs(60));
        assert_eq!(config.backoff_base, Duration::from_secs(2));
        assert_eq!(config.backoff_cap, Duration::from_secs(120));
        assert_eq!(config.max_admission_wait, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_burst_admits_within_quota() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(5, Duration::from_secs(60)));
        let started = std::time::Instant::now();
        for _ in 0..5 {
            limiter.admit().await.unwrap();
        }
        // The full burst fits the bucket; no pacing delay expected
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_admission_paces_beyond_burst() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(2, Duration::from_millis(200)));
        limiter.admit().await.unwrap();
        limiter.admit().await.unwrap();

        // Bucket drained; the next admission waits for a replenish interval
        let started = std::time::Instant::now();
        limiter.admit().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_backoff_escalates_and_caps() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            backoff_base: Duration::from_millis(10),
            backoff_cap: Duration::from_millis(30),
            ..RateLimiterConfig::default()
        });

        assert_eq!(limiter.note_throttled(None), Duration::from_millis(10));
        assert_eq!(limiter.note_throttled(None), Duration::from_millis(20));
        assert_eq!(limiter.note_throttled(None), Duration::from_millis(30));
        assert_eq!(limiter.note_throttled(None), Duration::from_millis(30));
    }

    #[test]
    fn test_server_retry_after_wins_when_larger() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            backoff_base: Duration::from_millis(10),
            ..RateLimiterConfig::default()
        });

        let delay = limiter.note_throttled(Some(Duration::from_secs(3)));
        assert_eq!(delay, Duration::from_secs(3));
    }

    #[test]
    fn test_success_clears_penalty() {
        let limiter = RateLimiter::new(RateLimiterConfig::default());
        limiter.note_throttled(None);
        assert_eq!(limiter.current_backoff(), Duration::from_secs(2));

        limiter.record_response(Some(29), Some(Duration::from_secs(60)));
        assert_eq!(limiter.current_backoff(), Duration::ZERO);
        assert_eq!(limiter.remaining_quota(), Some(29));
    }

    #[tokio::test]
    async fn test_admission_wait_ceiling() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            backoff_base: Duration::from_secs(10),
            max_admission_wait: Duration::from_millis(50),
            ..RateLimiterConfig::default()
        });
        limiter.note_throttled(None);

        let err = limiter.admit().await.unwrap_err();
        assert!(matches!(err, Error::Throttled { .. }));
    }
}
