//! SQLite implementation of the reviewer storage contract.
//!
//! Each write unit is a `BEGIN IMMEDIATE` transaction: it takes the database
//! write lock up front, so the reads inside it see a snapshot no other writer
//! can change until the unit commits or is dropped. Read units use a deferred
//! `BEGIN` and never take the write lock.

use crate::db::pool::DbPool;
use crate::db::{pull_requests, users};
use crate::error::AppError;
use crate::models::{NewPullRequest, PullRequest};
use crate::services::store::{ReviewerStore, ReviewerUnit};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

/// Reviewer store backed by the shared connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewerStore for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn ReviewerUnit>, AppError> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "begin"))?;

        Ok(Box::new(SqliteUnit { tx }))
    }

    async fn begin_read(&self) -> Result<Box<dyn ReviewerUnit>, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "begin_read"))?;

        Ok(Box::new(SqliteUnit { tx }))
    }
}

/// One open transaction.
pub struct SqliteUnit {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ReviewerUnit for SqliteUnit {
    async fn get_pull_request(&mut self, id: &str) -> Result<Option<PullRequest>, AppError> {
        Ok(pull_requests::get_pull_request(&mut *self.tx, id).await?)
    }

    async fn member_exists(&mut self, member_id: &str) -> Result<bool, AppError> {
        Ok(users::user_exists(&mut *self.tx, member_id).await?)
    }

    async fn insert_pull_request(
        &mut self,
        input: &NewPullRequest,
        created_at: i64,
    ) -> Result<PullRequest, AppError> {
        pull_requests::insert_pull_request(&mut *self.tx, input, created_at)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "insert_pull_request"))
    }

    async fn mark_merged(&mut self, id: &str, merged_at: i64) -> Result<PullRequest, AppError> {
        pull_requests::mark_merged(&mut *self.tx, id, merged_at)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("PullRequest", id))
    }

    async fn count_active_teammates(&mut self, member_id: &str) -> Result<i64, AppError> {
        Ok(users::count_active_teammates(&mut *self.tx, member_id).await?)
    }

    async fn draw_active_teammate(&mut self, member_id: &str) -> Result<String, AppError> {
        users::random_active_teammate(&mut *self.tx, member_id)
            .await?
            .ok_or_else(|| AppError::NoEligibleCandidates {
                pr_id: String::new(),
            })
    }

    async fn list_active_teammates(&mut self, member_id: &str) -> Result<Vec<String>, AppError> {
        Ok(users::active_teammates(&mut *self.tx, member_id).await?)
    }

    async fn insert_reviewer_link(
        &mut self,
        pr_id: &str,
        member_id: &str,
    ) -> Result<(), AppError> {
        pull_requests::insert_reviewer_link(&mut *self.tx, pr_id, member_id)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "insert_reviewer_link"))
    }

    async fn delete_reviewer_link(
        &mut self,
        pr_id: &str,
        member_id: &str,
    ) -> Result<(), AppError> {
        pull_requests::delete_reviewer_link(&mut *self.tx, pr_id, member_id)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "delete_reviewer_link"))?;

        Ok(())
    }

    async fn list_reviewers(&mut self, pr_id: &str) -> Result<Vec<String>, AppError> {
        Ok(pull_requests::list_reviewers(&mut *self.tx, pr_id).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "commit"))
    }
}
