//! Rotator driving real HTTP backends against local mock servers

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dispatcher::{
    BackendKind, DispatchError, DispatchRequest, Dispatcher, ProviderDescriptor, ProviderId, ProviderRegistry,
    QuotaLimits, RealGroqBackend, Rotator, RotatorConfig,
};
use shared::ApiFailure;

async fn groq_server(status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn groq_provider(server: &MockServer) -> (ProviderDescriptor, Arc<RealGroqBackend>) {
    let descriptor = ProviderDescriptor::new(BackendKind::Groq, "llama-test", QuotaLimits::new(5, 100, Some(10_000)));
    let backend = RealGroqBackend::new("test-key", "llama-test").with_base_url(server.uri());
    (descriptor, Arc::new(backend))
}

fn unpaced() -> RotatorConfig {
    RotatorConfig {
        pacing: false,
        ..RotatorConfig::default()
    }
}

#[tokio::test]
async fn test_rate_limited_provider_is_skipped_until_rollover() {
    let limited = groq_server(
        429,
        json!({ "error": { "message": "Rate limit reached on requests per minute (RPM)" } }),
    )
    .await;
    let healthy = groq_server(
        200,
        json!({ "choices": [{ "message": { "content": "Love the colors" } }] }),
    )
    .await;

    let (first, first_backend) = groq_provider(&limited);
    let (second, second_backend) = groq_provider(&healthy);
    let registry = ProviderRegistry::new()
        .with_provider(first, first_backend)
        .with_provider(second, second_backend);
    let rotator = Rotator::new(registry, unpaced());

    let err = rotator.dispatch(DispatchRequest::text("React")).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::ProviderFailed {
            reason: ApiFailure::RateLimitExceeded,
            ..
        }
    ));

    // Provider 0 now reports a full minute window and is passed over
    for _ in 0..3 {
        let response = rotator.dispatch(DispatchRequest::text("React")).await.unwrap();
        assert_eq!(response.provider, Some(ProviderId::new(1)));
        assert_eq!(response.content, "Love the colors");
    }

    let status = rotator.provider_status().await;
    assert_eq!(status[0].requests_this_minute, status[0].rpm);
    assert_eq!(status[1].requests_this_minute, 3);
    assert!(status[1].tokens_today > 0);
    assert!(!status[0].exhausted);
}

#[tokio::test]
async fn test_daily_quota_failure_exhausts_provider() {
    let spent = groq_server(
        429,
        json!({ "error": { "message": "Rate limit reached on tokens per day (TPD)" } }),
    )
    .await;
    let healthy = groq_server(200, json!({ "choices": [{ "message": { "content": "Nice" } }] })).await;

    let (first, first_backend) = groq_provider(&spent);
    let (second, second_backend) = groq_provider(&healthy);
    let registry = ProviderRegistry::new()
        .with_provider(first, first_backend)
        .with_provider(second, second_backend);
    let rotator = Rotator::new(registry, unpaced());

    assert!(rotator.dispatch(DispatchRequest::text("React")).await.is_err());

    let status = rotator.provider_status().await;
    assert!(status[0].exhausted);
    assert_eq!(status[0].tokens_today, 10_000);

    let response = rotator.dispatch(DispatchRequest::text("React")).await.unwrap();
    assert_eq!(response.provider, Some(ProviderId::new(1)));
}
