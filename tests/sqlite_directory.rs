// tests/sqlite_directory.rs
// Contract tests for the persistent team directory on an in-memory pool.
// The behavior here must match the memory backend exactly.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use teamchat::teams::{SqliteTeamDirectory, TeamDirectory, TeamError};

async fn test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("create in-memory sqlite")
}

async fn directory() -> (SqliteTeamDirectory, SqlitePool) {
    let pool = test_pool().await;
    let directory = SqliteTeamDirectory::new(pool.clone());
    directory.migrate().await.expect("migrate");
    (directory, pool)
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let (directory, _pool) = directory().await;
    directory.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn create_and_list_in_id_order() {
    let (directory, _pool) = directory().await;
    let first = directory.create_team("First", None).await.unwrap();
    let second = directory.create_team("Second", Some(5)).await.unwrap();
    assert!(first.team_id < second.team_id);

    let teams = directory.list_teams().await;
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].team_name, "First");
    assert_eq!(teams[0].member_limit, None);
    assert_eq!(teams[1].team_name, "Second");
    assert_eq!(teams[1].member_limit, Some(5));
}

#[tokio::test]
async fn validation_happens_before_any_row_is_written() {
    let (directory, _pool) = directory().await;
    let err = directory.create_team("Beta", Some(-1)).await.unwrap_err();
    assert!(matches!(err, TeamError::Validation(_)));
    let err = directory.create_team("", None).await.unwrap_err();
    assert!(matches!(err, TeamError::Validation(_)));
    assert!(directory.list_teams().await.is_empty());
}

#[tokio::test]
async fn membership_capacity_and_idempotent_rejoin() {
    let (directory, _pool) = directory().await;
    let team = directory.create_team("Alpha", Some(2)).await.unwrap();

    directory.add_member(team.team_id, "k1", "a@x.com").await.unwrap();
    directory.add_member(team.team_id, "k2", "b@x.com").await.unwrap();

    let err = directory
        .add_member(team.team_id, "k3", "c@x.com")
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::CapacityExceeded(_)));

    // Existing member re-joins a full team and gets their email refreshed.
    directory
        .add_member(team.team_id, "k1", "new@x.com")
        .await
        .unwrap();

    let teams = directory.list_teams().await;
    assert_eq!(teams[0].members.len(), 2);
    assert_eq!(teams[0].members["k1"], "new@x.com");
}

#[tokio::test]
async fn add_member_to_unknown_team_is_not_found() {
    let (directory, _pool) = directory().await;
    let err = directory.add_member(42, "k1", "a@x.com").await.unwrap_err();
    assert!(matches!(err, TeamError::NotFound(42)));
}

#[tokio::test]
async fn list_degrades_to_empty_when_store_is_unreachable() {
    let (directory, pool) = directory().await;
    directory.create_team("Alpha", None).await.unwrap();

    pool.close().await;
    assert!(directory.list_teams().await.is_empty());
}

#[tokio::test]
async fn team_skills_join_members_with_json_columns() {
    let (directory, pool) = directory().await;
    let team = directory.create_team("Platform", None).await.unwrap();
    directory.add_member(team.team_id, "u1", "dev@x.com").await.unwrap();
    directory.add_member(team.team_id, "u2", "ops@x.com").await.unwrap();

    // Skills are ingested outside the request path; seed the columns the
    // same way that tooling would.
    sqlx::query("UPDATE teams SET soft_skills = ?, hard_skills = ? WHERE id = ?")
        .bind(r#"{"u1":["mentoring"]}"#)
        .bind(r#"{"u1":{"programming":["Rust"],"tools":["Docker"]}}"#)
        .bind(team.team_id)
        .execute(&pool)
        .await
        .unwrap();

    let skills = directory.team_skills(team.team_id).await.unwrap();
    assert_eq!(skills.len(), 2);

    let u1 = skills.iter().find(|s| s.user_key == "u1").unwrap();
    assert_eq!(u1.user_email, "dev@x.com");
    assert_eq!(u1.soft, vec!["mentoring".to_string()]);
    assert_eq!(u1.hard.programming, vec!["Rust".to_string()]);
    assert_eq!(u1.hard.tools, vec!["Docker".to_string()]);

    let u2 = skills.iter().find(|s| s.user_key == "u2").unwrap();
    assert!(u2.soft.is_empty());
    assert!(u2.hard.is_empty());
}

#[tokio::test]
async fn team_skills_for_unknown_team_is_not_found() {
    let (directory, _pool) = directory().await;
    let err = directory.team_skills(99).await.unwrap_err();
    assert!(matches!(err, TeamError::NotFound(99)));
}
