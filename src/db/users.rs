//! Database queries for users and their team-scoped activity.
//!
//! The teammate queries resolve the member's team with a subquery, so every
//! count and draw is scoped to the same team.

use crate::models::{PullRequestShort, User};
use sqlx::sqlite::SqliteExecutor;

pub async fn user_exists(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(executor)
        .await
}

/// Insert a user, or move an existing one into `user.team_name` with the new
/// username and active flag. Either way the user becomes the newest member of
/// that team.
pub async fn upsert_user(
    executor: impl SqliteExecutor<'_>,
    user: &User,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, is_active, team_name, joined_seq)
        VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(joined_seq), 0) + 1 FROM users))
        ON CONFLICT(id) DO UPDATE SET
            username = excluded.username,
            is_active = excluded.is_active,
            team_name = excluded.team_name,
            joined_seq = excluded.joined_seq
        RETURNING id, username, team_name, is_active
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(user.is_active)
    .bind(&user.team_name)
    .fetch_one(executor)
    .await
}

/// Update the active flag. Returns `None` if the user does not exist.
pub async fn set_is_active(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    is_active: bool,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET is_active = ?
        WHERE id = ?
        RETURNING id, username, team_name, is_active
        "#,
    )
    .bind(is_active)
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Count active members of `member_id`'s team, the member included.
pub async fn count_active_teammates(
    executor: impl SqliteExecutor<'_>,
    member_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM users
        WHERE team_name = (SELECT team_name FROM users WHERE id = ?)
          AND is_active = 1
        "#,
    )
    .bind(member_id)
    .fetch_one(executor)
    .await
}

/// Pick one active member of `member_id`'s team uniformly at random.
pub async fn random_active_teammate(
    executor: impl SqliteExecutor<'_>,
    member_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT id
        FROM users
        WHERE team_name = (SELECT team_name FROM users WHERE id = ?)
          AND is_active = 1
        ORDER BY RANDOM()
        LIMIT 1
        "#,
    )
    .bind(member_id)
    .fetch_optional(executor)
    .await
}

/// List every active member of `member_id`'s team.
pub async fn active_teammates(
    executor: impl SqliteExecutor<'_>,
    member_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT id
        FROM users
        WHERE team_name = (SELECT team_name FROM users WHERE id = ?)
          AND is_active = 1
        ORDER BY joined_seq
        "#,
    )
    .bind(member_id)
    .fetch_all(executor)
    .await
}

/// Pull requests on which the user is currently a reviewer.
pub async fn review_queue(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
) -> Result<Vec<PullRequestShort>, sqlx::Error> {
    sqlx::query_as::<_, PullRequestShort>(
        r#"
        SELECT pr.id, pr.name, pr.author_id, pr.status
        FROM pull_requests pr
        JOIN pr_reviewers rev ON rev.pr_id = pr.id
        WHERE rev.user_id = ?
        ORDER BY pr.created_at, pr.id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
