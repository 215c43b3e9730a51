//! Database queries for teams.

use crate::models::Member;
use sqlx::sqlite::SqliteExecutor;

/// Check whether a team with this name exists.
pub async fn team_exists(
    executor: impl SqliteExecutor<'_>,
    name: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?)")
        .bind(name)
        .fetch_one(executor)
        .await
}

pub async fn insert_team(executor: impl SqliteExecutor<'_>, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO teams (name) VALUES (?)")
        .bind(name)
        .execute(executor)
        .await?;

    Ok(())
}

/// List a team's members in the order they joined.
pub async fn list_members(
    executor: impl SqliteExecutor<'_>,
    team_name: &str,
) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        r#"
        SELECT id, username, is_active
        FROM users
        WHERE team_name = ?
        ORDER BY joined_seq
        "#,
    )
    .bind(team_name)
    .fetch_all(executor)
    .await
}
