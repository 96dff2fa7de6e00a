// src/api/http/router.rs
// HTTP router composition for the backend API endpoints

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::{
    conversation::conversation_handler,
    handlers::health_handler,
    teams::{create_team_handler, join_team_handler, list_teams_handler},
};
use crate::state::AppState;

/// Main HTTP router. Paths mirror the browser client's expectations.
pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))

        // Chat (SSE)
        .route("/backend-api/v2/conversation", post(conversation_handler))

        // Teams
        .route(
            "/backend-api/v2/teams",
            post(create_team_handler).get(list_teams_handler),
        )
        .route("/backend-api/v2/teams/join", post(join_team_handler))

        .with_state(app_state)
}
