// src/teams/mod.rs
// Team directory contract shared by the sqlite and in-memory backends.

pub mod memory;
pub mod store;

pub use memory::MemoryTeamDirectory;
pub use store::SqliteTeamDirectory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A team record as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub team_name: String,
    pub member_limit: Option<i64>,
    /// user_key -> user_email
    pub members: BTreeMap<String, String>,
}

/// Hard skills grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardSkills {
    #[serde(default)]
    pub programming: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl HardSkills {
    pub fn is_empty(&self) -> bool {
        self.programming.is_empty() && self.tools.is_empty()
    }
}

/// Read-only per-member skills view consumed by the prompt builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSkills {
    pub user_key: String,
    pub user_email: String,
    #[serde(default)]
    pub soft: Vec<String>,
    #[serde(default)]
    pub hard: HardSkills,
}

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("{0}")]
    Validation(String),
    #[error("team {0} not found")]
    NotFound(i64),
    #[error("team {0} is at its member limit")]
    CapacityExceeded(i64),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("member map serialization failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("concurrent update lost on team {0}")]
    Contention(i64),
}

/// Contract satisfied by both backends. Callers stay agnostic to which one
/// is active; the choice is made once, in the composition root.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Creates a team and returns the stored record with its new id.
    async fn create_team(&self, name: &str, member_limit: Option<i64>) -> Result<Team, TeamError>;

    /// Adds (or re-adds) a member. Re-joining always succeeds and refreshes
    /// the stored email; the capacity check only applies to keys not yet
    /// present.
    async fn add_member(
        &self,
        team_id: i64,
        user_key: &str,
        user_email: &str,
    ) -> Result<(), TeamError>;

    /// All teams, ascending by id. Read failures degrade to an empty list.
    async fn list_teams(&self) -> Vec<Team>;

    /// Skills for every current member of the team.
    async fn team_skills(&self, team_id: i64) -> Result<Vec<MemberSkills>, TeamError>;
}

/// Create-time validation, shared by both backends. Runs before any
/// mutation so a rejected call leaves no partial state behind.
pub(crate) fn validate_new_team(name: &str, member_limit: Option<i64>) -> Result<(), TeamError> {
    if name.trim().is_empty() {
        return Err(TeamError::Validation("team_name must not be empty".into()));
    }
    if let Some(limit) = member_limit {
        if limit < 1 {
            return Err(TeamError::Validation(format!(
                "member_limit must be a positive integer, got {limit}"
            )));
        }
    }
    Ok(())
}
