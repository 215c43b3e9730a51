//! Database queries for pull requests and their reviewer links.

use crate::models::{NewPullRequest, PullRequest};
use sqlx::sqlite::SqliteExecutor;

pub async fn get_pull_request(
    executor: impl SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<PullRequest>, sqlx::Error> {
    sqlx::query_as::<_, PullRequest>(
        r#"
        SELECT id, name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Insert a new pull request in `OPEN` state.
pub async fn insert_pull_request(
    executor: impl SqliteExecutor<'_>,
    input: &NewPullRequest,
    created_at: i64,
) -> Result<PullRequest, sqlx::Error> {
    sqlx::query_as::<_, PullRequest>(
        r#"
        INSERT INTO pull_requests (id, name, author_id, status, created_at)
        VALUES (?, ?, ?, 'OPEN', ?)
        RETURNING id, name, author_id, status, created_at, merged_at
        "#,
    )
    .bind(&input.id)
    .bind(&input.name)
    .bind(&input.author_id)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

/// Move a pull request to `MERGED`. An existing merge timestamp is kept.
pub async fn mark_merged(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    merged_at: i64,
) -> Result<Option<PullRequest>, sqlx::Error> {
    sqlx::query_as::<_, PullRequest>(
        r#"
        UPDATE pull_requests
        SET status = 'MERGED',
            merged_at = COALESCE(merged_at, ?)
        WHERE id = ?
        RETURNING id, name, author_id, status, created_at, merged_at
        "#,
    )
    .bind(merged_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Reviewer IDs in assignment order.
pub async fn list_reviewers(
    executor: impl SqliteExecutor<'_>,
    pr_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM pr_reviewers WHERE pr_id = ? ORDER BY rowid")
        .bind(pr_id)
        .fetch_all(executor)
        .await
}

pub async fn insert_reviewer_link(
    executor: impl SqliteExecutor<'_>,
    pr_id: &str,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO pr_reviewers (pr_id, user_id) VALUES (?, ?)")
        .bind(pr_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Remove a reviewer link. Returns the number of rows removed.
pub async fn delete_reviewer_link(
    executor: impl SqliteExecutor<'_>,
    pr_id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ? AND user_id = ?")
        .bind(pr_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
