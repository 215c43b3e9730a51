//! Storage contract consumed by the reviewer engine and the lifecycle controller.
//!
//! A [`ReviewerStore`] hands out [`ReviewerUnit`]s. A unit is one atomic
//! read-validate-write scope: everything done through it becomes visible on
//! [`ReviewerUnit::commit`], and dropping it without committing discards the
//! changes. Units on the same store are mutually exclusive, which is what keeps
//! two concurrent reassignments from both passing the room check.

use crate::error::AppError;
use crate::models::{NewPullRequest, PullRequest};
use async_trait::async_trait;

/// Factory for atomic storage units.
#[async_trait]
pub trait ReviewerStore: Send + Sync {
    /// Open a new unit. Waits until no other writer holds the store.
    async fn begin(&self) -> Result<Box<dyn ReviewerUnit>, AppError>;

    /// Open a unit for reads only. It does not wait for writers, and any
    /// change made through it is discarded on drop.
    async fn begin_read(&self) -> Result<Box<dyn ReviewerUnit>, AppError>;
}

/// Operations available inside one atomic unit.
///
/// All teammate queries are scoped to the team of the given member.
#[async_trait]
pub trait ReviewerUnit: Send {
    /// Pull request without reviewers, or `None` if absent.
    async fn get_pull_request(&mut self, id: &str) -> Result<Option<PullRequest>, AppError>;

    async fn member_exists(&mut self, member_id: &str) -> Result<bool, AppError>;

    /// Insert a pull request in `OPEN` state.
    async fn insert_pull_request(
        &mut self,
        input: &NewPullRequest,
        created_at: i64,
    ) -> Result<PullRequest, AppError>;

    /// Transition to `MERGED`, stamping `merged_at`.
    async fn mark_merged(&mut self, id: &str, merged_at: i64) -> Result<PullRequest, AppError>;

    /// Active members of the member's team, the member included if active.
    async fn count_active_teammates(&mut self, member_id: &str) -> Result<i64, AppError>;

    /// Uniformly random active member of the member's team.
    ///
    /// Fails with `NoEligibleCandidates` if the team has no active member.
    async fn draw_active_teammate(&mut self, member_id: &str) -> Result<String, AppError>;

    async fn list_active_teammates(&mut self, member_id: &str) -> Result<Vec<String>, AppError>;

    async fn insert_reviewer_link(&mut self, pr_id: &str, member_id: &str)
        -> Result<(), AppError>;

    async fn delete_reviewer_link(&mut self, pr_id: &str, member_id: &str)
        -> Result<(), AppError>;

    /// Reviewer IDs in assignment order.
    async fn list_reviewers(&mut self, pr_id: &str) -> Result<Vec<String>, AppError>;

    /// Make every change done through this unit durable.
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
