// src/api/http/teams.rs
// Team creation, joining and listing endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: Option<String>,
    #[serde(default)]
    pub member_limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct JoinTeamRequest {
    pub team_id: Option<i64>,
    pub user_key: Option<String>,
    pub user_email: Option<String>,
}

pub async fn create_team_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = request
        .team_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("team_name required"))?;

    let team = state.teams.create_team(name, request.member_limit).await?;
    info!(team_id = team.team_id, "team created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "team_id": team.team_id,
            "team_name": team.team_name,
            "member_limit": team.member_limit,
        })),
    ))
}

pub async fn join_team_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(team_id), Some(user_key), Some(user_email)) = (
        request.team_id,
        request.user_key.filter(|key| !key.is_empty()),
        request.user_email.filter(|email| !email.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "team_id, user_key and user_email required",
        ));
    };

    state.teams.add_member(team_id, &user_key, &user_email).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_teams_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let teams = state.teams.list_teams().await;
    Json(json!({ "success": true, "teams": teams }))
}
