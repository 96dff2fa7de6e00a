// src/state.rs

use std::sync::Arc;

use crate::llm::client::GeminiClient;
use crate::teams::TeamDirectory;

/// Shared per-process state handed to every request handler. The team
/// directory backend is injected here by the composition root, never
/// detected ad hoc inside handlers.
#[derive(Clone)]
pub struct AppState {
    pub teams: Arc<dyn TeamDirectory>,
    pub gemini: Arc<GeminiClient>,
}

impl AppState {
    pub fn new(teams: Arc<dyn TeamDirectory>, gemini: Arc<GeminiClient>) -> Self {
        Self { teams, gemini }
    }
}
