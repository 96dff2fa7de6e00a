// src/teams/memory.rs
// Process-local team directory. State is owned by the directory value, not
// a module global; the mutex serializes the capacity check against the
// insert that follows it.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{validate_new_team, HardSkills, MemberSkills, Team, TeamDirectory, TeamError};

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    teams: BTreeMap<i64, Team>,
    soft_skills: BTreeMap<i64, BTreeMap<String, Vec<String>>>,
    hard_skills: BTreeMap<i64, BTreeMap<String, HardSkills>>,
}

#[derive(Debug, Default)]
pub struct MemoryTeamDirectory {
    inner: Mutex<MemoryInner>,
}

impl MemoryTeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds skill data for a member. The request path only reads skills;
    /// this is the ingestion side used by tooling and tests.
    pub fn set_member_skills(
        &self,
        team_id: i64,
        user_key: &str,
        soft: Vec<String>,
        hard: HardSkills,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .soft_skills
            .entry(team_id)
            .or_default()
            .insert(user_key.to_string(), soft);
        inner
            .hard_skills
            .entry(team_id)
            .or_default()
            .insert(user_key.to_string(), hard);
    }
}

#[async_trait]
impl TeamDirectory for MemoryTeamDirectory {
    async fn create_team(&self, name: &str, member_limit: Option<i64>) -> Result<Team, TeamError> {
        validate_new_team(name, member_limit)?;

        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let team = Team {
            team_id: inner.next_id,
            team_name: name.trim().to_string(),
            member_limit,
            members: BTreeMap::new(),
        };
        inner.teams.insert(team.team_id, team.clone());
        debug!(team_id = team.team_id, "created team in memory store");
        Ok(team)
    }

    async fn add_member(
        &self,
        team_id: i64,
        user_key: &str,
        user_email: &str,
    ) -> Result<(), TeamError> {
        let mut inner = self.inner.lock().unwrap();
        let team = inner
            .teams
            .get_mut(&team_id)
            .ok_or(TeamError::NotFound(team_id))?;

        // Idempotent re-join comes first: an existing member is never
        // evicted by a limit reached after they joined.
        if !team.members.contains_key(user_key) {
            if let Some(limit) = team.member_limit {
                if team.members.len() as i64 >= limit {
                    return Err(TeamError::CapacityExceeded(team_id));
                }
            }
        }
        team.members
            .insert(user_key.to_string(), user_email.to_string());
        Ok(())
    }

    async fn list_teams(&self) -> Vec<Team> {
        let inner = self.inner.lock().unwrap();
        inner.teams.values().cloned().collect()
    }

    async fn team_skills(&self, team_id: i64) -> Result<Vec<MemberSkills>, TeamError> {
        let inner = self.inner.lock().unwrap();
        let team = inner
            .teams
            .get(&team_id)
            .ok_or(TeamError::NotFound(team_id))?;
        let soft = inner.soft_skills.get(&team_id);
        let hard = inner.hard_skills.get(&team_id);

        Ok(team
            .members
            .iter()
            .map(|(key, email)| MemberSkills {
                user_key: key.clone(),
                user_email: email.clone(),
                soft: soft.and_then(|m| m.get(key)).cloned().unwrap_or_default(),
                hard: hard.and_then(|m| m.get(key)).cloned().unwrap_or_default(),
            })
            .collect())
    }
}
