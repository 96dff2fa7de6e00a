// src/api/http/conversation.rs
// POST /backend-api/v2/conversation: builds the system prompt, calls the
// upstream model, and relays the translated stream as server-sent events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::llm::client::LlmError;
use crate::llm::payload::{build_payload, ConversationMessage};
use crate::llm::streaming::{translate_stream, StreamEvent, StreamOutcome};
use crate::prompt;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ConversationRequest {
    pub meta: RequestMeta,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(rename = "generationConfig", default)]
    pub generation_config: Option<Map<String, Value>>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
pub struct RequestMeta {
    pub content: RequestContent,
}

#[derive(Deserialize)]
pub struct RequestContent {
    #[serde(default)]
    pub conversation: Vec<ConversationMessage>,
    #[serde(default)]
    pub parts: Vec<ConversationMessage>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

pub async fn conversation_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ConversationRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let user_id = header_str(&headers, "X-User-ID");
    let user_email = header_str(&headers, "X-User-Email");
    let team_id = header_str(&headers, "X-Team-ID");

    let RequestContent { conversation, parts } = request.meta.content;
    let prompt_message = parts
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::bad_request("meta.content.parts must contain the prompt"))?;

    let system_message =
        prompt::build_system_prompt(state.teams.as_ref(), team_id, user_id, user_email).await;

    let mut full_conversation = Vec::with_capacity(conversation.len() + 2);
    full_conversation.push(ConversationMessage::system(system_message.clone()));
    full_conversation.extend(conversation);
    full_conversation.push(prompt_message);

    let payload = build_payload(
        &full_conversation,
        &system_message,
        request.generation_config.unwrap_or_default(),
    );

    let model = request
        .model
        .unwrap_or_else(|| state.gemini.default_model().to_string());
    info!(%model, "forwarding conversation upstream");

    let response = state
        .gemini
        .send(&model, &payload, request.api_key.as_deref())
        .await
        .map_err(|e| match e {
            LlmError::Upstream { status, body } => ApiError::custom(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                format!("Gemini request failed: {status} {body}"),
            ),
            other => ApiError::bad_request(format!("an error occurred: {other}")),
        })?;

    let translated = translate_stream(response.bytes_stream());
    let sse_stream = async_stream::stream! {
        futures::pin_mut!(translated);
        while let Some(event) = translated.next().await {
            match event {
                StreamEvent::Text(text) => {
                    yield Ok(Event::default().data(json!({ "text": text }).to_string()));
                }
                StreamEvent::Done(StreamOutcome::Complete) => break,
                StreamEvent::Done(StreamOutcome::Failed(reason)) => {
                    // The consumer only ever sees the stream end; the fault
                    // stays in the logs.
                    warn!("conversation stream ended after upstream fault: {reason}");
                    break;
                }
            }
        }
    };

    Ok(Sse::new(sse_stream))
}
