// src/teams/store.rs
// SQLite-backed team directory. Members and skills live in JSON columns so
// new attributes stay additive; membership writes go through a
// compare-and-set on the serialized member map.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use super::{validate_new_team, HardSkills, MemberSkills, Team, TeamDirectory, TeamError};

const CAS_ATTEMPTS: usize = 3;

pub struct SqliteTeamDirectory {
    pool: SqlitePool,
}

impl SqliteTeamDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the schema if missing. Later columns are added with
    /// ALTER TABLE so rows written by older builds survive upgrades.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                members TEXT NOT NULL DEFAULT '{}',
                soft_skills TEXT NOT NULL DEFAULT '{}',
                hard_skills TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // member_limit arrived after the first schema; tolerate both shapes.
        if let Err(e) = sqlx::query("ALTER TABLE teams ADD COLUMN member_limit INTEGER")
            .execute(&self.pool)
            .await
        {
            debug!("member_limit column already present: {e}");
        }
        Ok(())
    }

    fn row_to_team(row: &sqlx::sqlite::SqliteRow) -> Team {
        let raw_members: String = row.get("members");
        Team {
            team_id: row.get("id"),
            team_name: row.get("name"),
            member_limit: row.get("member_limit"),
            members: serde_json::from_str(&raw_members).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl TeamDirectory for SqliteTeamDirectory {
    async fn create_team(&self, name: &str, member_limit: Option<i64>) -> Result<Team, TeamError> {
        validate_new_team(name, member_limit)?;

        let row = sqlx::query(
            r#"
            INSERT INTO teams (name, members, soft_skills, hard_skills, member_limit)
            VALUES (?, '{}', '{}', '{}', ?)
            RETURNING id
            "#,
        )
        .bind(name.trim())
        .bind(member_limit)
        .fetch_one(&self.pool)
        .await?;

        let team_id: i64 = row.get("id");
        debug!(team_id, "created team");
        Ok(Team {
            team_id,
            team_name: name.trim().to_string(),
            member_limit,
            members: BTreeMap::new(),
        })
    }

    async fn add_member(
        &self,
        team_id: i64,
        user_key: &str,
        user_email: &str,
    ) -> Result<(), TeamError> {
        for attempt in 0..CAS_ATTEMPTS {
            let row = sqlx::query("SELECT members, member_limit FROM teams WHERE id = ?")
                .bind(team_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(TeamError::NotFound(team_id))?;

            let raw: String = row.get("members");
            let member_limit: Option<i64> = row.get("member_limit");
            let mut members: BTreeMap<String, String> =
                serde_json::from_str(&raw).unwrap_or_default();

            // Idempotent re-join comes first: an existing member is never
            // evicted by a limit reached after they joined.
            if !members.contains_key(user_key) {
                if let Some(limit) = member_limit {
                    if members.len() as i64 >= limit {
                        return Err(TeamError::CapacityExceeded(team_id));
                    }
                }
            }
            members.insert(user_key.to_string(), user_email.to_string());
            let updated = serde_json::to_string(&members)?;

            // Compare-and-set on the serialized map closes the window
            // between the capacity read and the write.
            let result = sqlx::query("UPDATE teams SET members = ? WHERE id = ? AND members = ?")
                .bind(&updated)
                .bind(team_id)
                .bind(&raw)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 1 {
                return Ok(());
            }
            warn!(team_id, attempt, "member map changed underneath us, retrying");
        }
        Err(TeamError::Contention(team_id))
    }

    async fn list_teams(&self) -> Vec<Team> {
        let rows = sqlx::query("SELECT id, name, members, member_limit FROM teams ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await;
        match rows {
            Ok(rows) => rows.iter().map(Self::row_to_team).collect(),
            Err(e) => {
                warn!("listing teams failed, returning empty set: {e}");
                Vec::new()
            }
        }
    }

    async fn team_skills(&self, team_id: i64) -> Result<Vec<MemberSkills>, TeamError> {
        let row = sqlx::query("SELECT members, soft_skills, hard_skills FROM teams WHERE id = ?")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TeamError::NotFound(team_id))?;

        let members: BTreeMap<String, String> =
            serde_json::from_str(&row.get::<String, _>("members")).unwrap_or_default();
        let soft: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&row.get::<String, _>("soft_skills")).unwrap_or_default();
        let hard: BTreeMap<String, HardSkills> =
            serde_json::from_str(&row.get::<String, _>("hard_skills")).unwrap_or_default();

        Ok(members
            .into_iter()
            .map(|(key, email)| MemberSkills {
                soft: soft.get(&key).cloned().unwrap_or_default(),
                hard: hard.get(&key).cloned().unwrap_or_default(),
                user_key: key,
                user_email: email,
            })
            .collect())
    }
}
