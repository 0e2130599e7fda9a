//! HTTP-level integration tests against a local wiremock server.

use std::sync::Arc;
use std::time::Duration;

use racecal_core::error::ExtractError;
use racecal_core::generative::Generator;
use racecal_core::hints::{HintRegistry, HintStrategy, SiteHint};
use racecal_core::sources::{
    CaptureTarget, HttpEndpointCapture, HttpPageFetcher, HttpTimeouts, NetworkCapture, PageFetcher,
};
use racecal_core::{ExtractRequest, ExtractionMethod, Extractor, ExtractorSettings, GeminiGenerator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn fetcher() -> HttpPageFetcher {
    HttpPageFetcher::new(HttpTimeouts::from_secs(5, 5)).unwrap()
}

// ==================== HttpPageFetcher ====================

#[tokio::test]
async fn test_fetcher_returns_body_and_status() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/calendar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>calendar</html>"))
        .mount(&server)
        .await;

    let page = fetcher()
        .fetch(&format!("{}/calendar", server.uri()), true)
        .await
        .unwrap();
    assert!(page.is_success());
    assert_eq!(page.content, "<html>calendar</html>");
}

#[tokio::test]
async fn test_fetcher_returns_non_success_status_without_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let page = fetcher()
        .fetch(&format!("{}/missing", server.uri()), true)
        .await
        .unwrap();
    assert_eq!(page.status, 404);
    assert!(!page.is_success());
}

#[tokio::test]
async fn test_fetcher_sends_project_user_agent() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ua"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    fetcher().fetch(&format!("{}/ua", server.uri()), false).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(agent.starts_with("racecal/"), "unexpected user agent: {agent}");
}

// ==================== HttpEndpointCapture ====================

#[tokio::test]
async fn test_endpoint_capture_fetches_referenced_json() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = r#"<html><script>
        fetch("/api/calendar.json");
        fetch("/api/calendar-broken");
        fetch("/api/news");
    </script></html>"#;
    Mock::given(method("GET"))
        .and(path("/season"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/calendar.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"races": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/calendar-broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"news": []})))
        .expect(0)
        .mount(&server)
        .await;

    let capture = HttpEndpointCapture::new(Arc::new(fetcher()));
    let page_url = format!("{}/season", server.uri());
    let responses = capture
        .capture(
            CaptureTarget::new(&page_url),
            &["calendar".to_string()],
            Duration::from_secs(5),
        )
        .await;

    assert_eq!(responses.len(), 1);
    assert!(responses[0].url.ends_with("/api/calendar.json"));
    assert_eq!(responses[0].json().unwrap(), json!({"races": []}));
}

#[tokio::test]
async fn test_endpoint_capture_unreachable_page_returns_nothing() {
    let capture =
        HttpEndpointCapture::new(Arc::new(HttpPageFetcher::new(HttpTimeouts::from_secs(1, 1)).unwrap()));
    let responses = capture
        .capture(
            CaptureTarget::new("http://127.0.0.1:9/season"),
            &["calendar".to_string()],
            Duration::from_secs(2),
        )
        .await;
    assert!(responses.is_empty());
}

// ==================== GeminiGenerator ====================

#[tokio::test]
async fn test_gemini_generate_returns_candidate_text() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {"maxOutputTokens": 8192}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "[{\"name\": \"Spa\"}]"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = GeminiGenerator::with_base_url("test-key", "gemini-test", server.uri()).unwrap();
    let reply = generator.generate("list the races").await.unwrap();
    assert_eq!(reply, r#"[{"name": "Spa"}]"#);
}

#[tokio::test]
async fn test_gemini_rate_limit_is_upstream_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let generator = GeminiGenerator::with_base_url("test-key", "gemini-test", server.uri()).unwrap();
    let err = generator.generate("prompt").await.unwrap_err();
    assert!(matches!(err, ExtractError::UpstreamUnreachable { .. }), "got {err}");
}

#[tokio::test]
async fn test_gemini_empty_candidates_is_invalid_output() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let generator = GeminiGenerator::with_base_url("test-key", "gemini-test", server.uri()).unwrap();
    let err = generator.generate("prompt").await.unwrap_err();
    assert!(matches!(err, ExtractError::GenerativeOutputInvalid { .. }), "got {err}");
}

// ==================== End to end ====================

#[tokio::test]
async fn test_hint_api_over_http() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/races/2026"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "races": [
                {"sequence": 1, "name": "Sao Paulo E-Prix", "city": "Sao Paulo",
                 "country": "Brazil", "date": "2026-03-14", "hasRaceResults": false}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut hints = HintRegistry::new();
    hints.register(
        SiteHint::new("127.0.0.1", HintStrategy::Api)
            .with_api_url(format!("{}/api/races/{{year}}", server.uri())),
    );
    let extractor = Extractor::builder(Arc::new(fetcher()))
        .hints(Arc::new(hints))
        .build();
    let result = extractor
        .fetch_season(&ExtractRequest::new(format!("{}/calendar", server.uri()), "formula_e", 2026))
        .await
        .unwrap();

    assert_eq!(result.method(), ExtractionMethod::HintApi);
    assert_eq!(result.events()[0].name, "Sao Paulo E-Prix");
    assert_eq!(result.events()[0].event_id, "formula_e_1");
}

#[tokio::test]
async fn test_capture_tier_over_http() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = r#"<html><body><div id="app"></div>
        <script>window.config = {"feed": "\/api\/schedule.json"};</script>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/season"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/schedule.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schedule": {"events": [
                {"name": "Round 1", "start_date": "2026-04-04", "end_date": "2026-04-05",
                 "city": "Long Beach", "country": "USA"}
            ]}
        })))
        .mount(&server)
        .await;

    let http = Arc::new(fetcher());
    let extractor = Extractor::builder(http.clone())
        .hints(Arc::new(HintRegistry::new()))
        .capture(Arc::new(HttpEndpointCapture::new(http)))
        .settings(ExtractorSettings::default().without_delays())
        .build();
    let result = extractor
        .fetch_season(&ExtractRequest::new(format!("{}/season", server.uri()), "indycar", 2026))
        .await
        .unwrap();

    assert_eq!(result.method(), ExtractionMethod::ApiCapture);
    let event = &result.events()[0];
    assert_eq!(event.venue.city, "Long Beach");
    assert_eq!(event.venue.timezone, "America/New_York");
}
