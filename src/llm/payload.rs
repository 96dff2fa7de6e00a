// src/llm/payload.rs
// Maps the internal role-tagged conversation into the Gemini request shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message roles as they arrive from the client. Anything we do not
/// recognize is treated as a model turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    #[serde(other)]
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

/// The request body for models/{model}:streamGenerateContent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamPayload {
    pub contents: Vec<Content>,
    pub system_instruction: SystemInstruction,
    pub generation_config: Map<String, Value>,
}

/// Builds the upstream payload from a conversation. System messages fold
/// into the system instruction (last one wins) and never appear in
/// `contents`; `user` maps to `user` and every other role to `model`.
pub fn build_payload(
    conversation: &[ConversationMessage],
    system_message: &str,
    generation_config: Map<String, Value>,
) -> UpstreamPayload {
    let mut system_instruction = system_message.to_string();
    let mut contents = Vec::with_capacity(conversation.len());

    for message in conversation {
        match message.role {
            Role::System => system_instruction = message.content.clone(),
            role => contents.push(Content {
                role: match role {
                    Role::User => "user".to_string(),
                    _ => "model".to_string(),
                },
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            }),
        }
    }

    UpstreamPayload {
        contents,
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: system_instruction,
            }],
        },
        generation_config,
    }
}
