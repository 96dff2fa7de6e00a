// tests/upstream_client.rs
// Upstream client behavior: fallback retry, error surfacing, and the
// stream translation over a real HTTP response body.

use futures::StreamExt;
use mockito::Matcher;
use serde_json::Map;

use teamchat::llm::client::{GeminiClient, GeminiConfig, LlmError};
use teamchat::llm::payload::{build_payload, UpstreamPayload};
use teamchat::llm::streaming::{translate_stream, StreamEvent, StreamOutcome};

fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        base_url: server.url(),
        api_key: "test-key".to_string(),
        model: "gemini-2.5-flash".to_string(),
        fallback_model: "gemini-1.5-flash".to_string(),
        timeout_secs: 5,
    })
    .expect("create client")
}

fn empty_payload() -> UpstreamPayload {
    build_payload(&[], "system", Map::new())
}

fn sse_query() -> Matcher {
    Matcher::UrlEncoded("alt".into(), "sse".into())
}

#[tokio::test]
async fn unknown_model_falls_back_exactly_once() {
    let mut server = mockito::Server::new_async().await;
    let primary = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:streamGenerateContent")
        .match_query(sse_query())
        .with_status(404)
        .create_async()
        .await;
    let fallback = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:streamGenerateContent")
        .match_query(sse_query())
        .with_status(200)
        .with_body("data: [DONE]\n\n")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .send("gemini-2.5-flash", &empty_payload(), None)
        .await
        .expect("fallback should succeed");
    assert_eq!(response.status().as_u16(), 200);

    primary.assert_async().await;
    fallback.assert_async().await;
}

#[tokio::test]
async fn fallback_model_is_never_retried() {
    let mut server = mockito::Server::new_async().await;
    let fallback = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:streamGenerateContent")
        .match_query(sse_query())
        .with_status(404)
        .with_body(r#"{"error":{"message":"not found"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .send("gemini-1.5-flash", &empty_payload(), None)
        .await
        .unwrap_err();
    match err {
        LlmError::Upstream { status, .. } => assert_eq!(status, 404),
        other => panic!("unexpected error: {other}"),
    }
    fallback.assert_async().await;
}

#[tokio::test]
async fn error_status_carries_parsed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:streamGenerateContent")
        .match_query(sse_query())
        .with_status(500)
        .with_body(r#"{"error":{"message":"internal"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .send("gemini-2.5-flash", &empty_payload(), None)
        .await
        .unwrap_err();
    match err {
        LlmError::Upstream { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body["error"]["message"], "internal");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn api_key_override_reaches_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:streamGenerateContent")
        .match_query(sse_query())
        .match_header("x-goog-api-key", "caller-key")
        .with_status(200)
        .with_body("data: [DONE]\n\n")
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .send("gemini-2.5-flash", &empty_payload(), Some("caller-key"))
        .await
        .expect("send");
    upstream.assert_async().await;
}

#[tokio::test]
async fn streamed_body_translates_to_text_events() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:streamGenerateContent")
        .match_query(sse_query())
        .with_status(200)
        .with_body(concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n",
            "data: [DONE]\n\n",
        ))
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .send("gemini-2.5-flash", &empty_payload(), None)
        .await
        .expect("send");

    let events: Vec<StreamEvent> = translate_stream(response.bytes_stream()).collect().await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Text("Hello".to_string()),
            StreamEvent::Done(StreamOutcome::Complete),
        ]
    );
}
