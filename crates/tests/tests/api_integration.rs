use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use folio_agents::DEFAULT_SUGGESTIONS;
use folio_api::{build_app, ApiConfig};
use folio_core::FALLBACK_REPLY;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    build_app(ApiConfig::default())
        .await
        .expect("app should build")
}

fn chat_request(text: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": text }).to_string()))
        .unwrap()
}

fn forwarded_chat_request(peer: &str, forwarded: &str) -> Request<Body> {
    let peer: SocketAddr = peer.parse().unwrap();
    let mut request = chat_request("hello");
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded.parse().unwrap());
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

async fn single_request_app(trust_forwarded_for: bool) -> Router {
    build_app(ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 1,
        trust_forwarded_for,
        ..ApiConfig::default()
    })
    .await
    .expect("app should build")
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["profile"], "Ganesh");
}

#[tokio::test]
async fn chat_answers_visa_question() {
    let response = app()
        .await
        .oneshot(chat_request("What is your visa status?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "visa");
    assert_eq!(parsed["render"], "typewriter");
    assert!(parsed["reply"].as_str().unwrap().contains("OPT"));
}

#[tokio::test]
async fn chat_falls_back_on_gibberish() {
    let response = app()
        .await
        .oneshot(chat_request("asdkjhasd irrelevant gibberish"))
        .await
        .unwrap();

    let parsed = json_body(response).await;
    assert_eq!(parsed["reply"], FALLBACK_REPLY);
    assert!(parsed["intent"].is_null());
}

#[tokio::test]
async fn resume_reply_carries_links() {
    let response = app()
        .await
        .oneshot(chat_request("where is your resume?"))
        .await
        .unwrap();

    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "resume");
    assert_eq!(parsed["render"], "instant");

    let hrefs = parsed["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["href"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert!(hrefs.contains(&"/resume/Ganesh_Resume.pdf".to_string()));
    assert!(parsed["segments"]
        .as_array()
        .unwrap()
        .iter()
        .any(|segment| segment["type"] == "link"));
}

#[tokio::test]
async fn blank_chat_is_rejected() {
    let response = app().await.oneshot(chat_request("   ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "empty_query");
}

#[tokio::test]
async fn suggestions_match_defaults() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .uri("/v1/suggestions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let parsed = json_body(response).await;
    assert_eq!(parsed["prompts"].as_array().unwrap().len(), DEFAULT_SUGGESTIONS.len());
    assert_eq!(parsed["rotation_ms"], 2600);
}

#[tokio::test]
async fn chat_is_rate_limited_per_client() {
    let app = build_app(ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        ..ApiConfig::default()
    })
    .await
    .expect("app should build");

    for _ in 0..2 {
        let response = app.clone().oneshot(chat_request("hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app.clone().oneshot(chat_request("hello")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().get("retry-after").is_some());

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() {
    let app = single_request_app(false).await;

    let first = app
        .clone()
        .oneshot(forwarded_chat_request("192.0.2.7:40000", "10.0.0.0"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    for octet in 1..5 {
        let response = app
            .clone()
            .oneshot(forwarded_chat_request(
                "192.0.2.7:40000",
                &format!("10.0.0.{octet}"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let other_peer = app
        .oneshot(forwarded_chat_request("192.0.2.8:40000", "10.0.0.0"))
        .await
        .unwrap();
    assert_eq!(other_peer.status(), StatusCode::OK);
}

#[tokio::test]
async fn trusted_forwarded_for_keys_each_client() {
    let app = single_request_app(true).await;

    for octet in 0..3 {
        let response = app
            .clone()
            .oneshot(forwarded_chat_request(
                "192.0.2.7:40000",
                &format!("10.0.0.{octet}"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let repeat = app
        .oneshot(forwarded_chat_request("192.0.2.7:40000", "10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn alternate_profile_is_served() {
    let path = std::env::temp_dir().join(format!("folio-profile-{}.json", std::process::id()));
    std::fs::write(
        &path,
        json!({
            "name": "Ada",
            "title": "Engineer",
            "summary": "Analytical engines.",
            "skills": "Rust",
            "experience": [{
                "company": "Babbage Works",
                "role": "Programmer",
                "timeRange": "1842 – 1843",
                "location": "London",
                "bullets": ["Wrote the first program."]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let app = build_app(ApiConfig {
        profile_path: Some(path.clone()),
        ..ApiConfig::default()
    })
    .await
    .expect("app should build");

    let response = app
        .oneshot(chat_request("your babbage experience"))
        .await
        .unwrap();
    let parsed = json_body(response).await;
    assert_eq!(
        parsed["reply"],
        "Babbage Works — Programmer (1842 – 1843, London)\n• Wrote the first program."
    );

    let _ = std::fs::remove_file(path);
}
