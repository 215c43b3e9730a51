//! Pull request lifecycle: create, merge, reassign.
//!
//! Every operation runs inside one storage unit, so the status checks and the
//! engine's reviewer changes either all land or none do.

use crate::db::now;
use crate::error::AppError;
use crate::models::{NewPullRequest, PullRequest};
use crate::services::reviewer_engine::{Reassignment, ReviewerEngine};
use crate::services::store::ReviewerStore;
use std::sync::Arc;

/// Lifecycle controller for pull requests.
#[derive(Clone)]
pub struct PullRequestService {
    store: Arc<dyn ReviewerStore>,
    engine: ReviewerEngine,
}

impl PullRequestService {
    pub fn new(store: Arc<dyn ReviewerStore>, engine: ReviewerEngine) -> Self {
        Self { store, engine }
    }

    /// Open a pull request and assign its initial reviewers.
    pub async fn create(&self, input: NewPullRequest) -> Result<PullRequest, AppError> {
        validate_new(&input)?;

        let mut unit = self.store.begin().await?;

        if unit.get_pull_request(&input.id).await?.is_some() {
            log::debug!("[pr] {} already exists", input.id);
            return Err(AppError::already_exists("PullRequest", &input.id));
        }
        if !unit.member_exists(&input.author_id).await? {
            log::debug!("[pr] Author {} of {} not found", input.author_id, input.id);
            return Err(AppError::not_found_with_id("User", &input.author_id));
        }

        let pull_request = unit
            .insert_pull_request(&input, now())
            .await
            .inspect_err(|e| log::error!("[pr] Failed to create {}: {}", input.id, e))?;
        let pull_request = self
            .engine
            .assign_initial_reviewers(unit.as_mut(), pull_request)
            .await
            .inspect_err(|e| log::error!("[pr] Failed to assign reviewers to {}: {}", input.id, e))?;

        unit.commit().await?;

        log::info!(
            "[pr] Created {} by {} with reviewers {:?}",
            pull_request.id,
            pull_request.author_id,
            pull_request.reviewers
        );
        Ok(pull_request)
    }

    /// Merge a pull request. Merging an already merged one returns it unchanged.
    pub async fn merge(&self, id: &str) -> Result<PullRequest, AppError> {
        let mut unit = self.store.begin().await?;

        let pull_request = unit
            .get_pull_request(id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("PullRequest", id))?;

        if pull_request.is_merged() {
            log::debug!("[pr] {} already merged", id);
            let reviewers = unit.list_reviewers(id).await?;
            return Ok(pull_request.with_reviewers(reviewers));
        }

        let merged = unit
            .mark_merged(id, now())
            .await
            .inspect_err(|e| log::error!("[pr] Failed to merge {}: {}", id, e))?;
        let reviewers = unit.list_reviewers(id).await?;

        unit.commit().await?;

        log::info!("[pr] Merged {}", id);
        Ok(merged.with_reviewers(reviewers))
    }

    /// Replace `old_reviewer_id` on an open pull request.
    pub async fn reassign(
        &self,
        id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        if old_reviewer_id.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "reviewer id is required",
                "old_user_id",
            ));
        }

        let mut unit = self.store.begin().await?;

        let pull_request = unit
            .get_pull_request(id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("PullRequest", id))?;

        if pull_request.is_merged() {
            log::debug!("[pr] Refusing to reassign on merged {}", id);
            return Err(AppError::already_merged(id));
        }

        let outcome = self
            .engine
            .reassign_reviewer(unit.as_mut(), id, old_reviewer_id)
            .await
            .inspect_err(|e| {
                log::warn!("[pr] Reassign of {} on {} failed: {}", old_reviewer_id, id, e)
            })?;

        unit.commit().await?;

        Ok(outcome)
    }

    /// Fetch a pull request with its reviewers.
    pub async fn get(&self, id: &str) -> Result<PullRequest, AppError> {
        let mut unit = self.store.begin_read().await?;

        let pull_request = unit
            .get_pull_request(id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("PullRequest", id))?;
        let reviewers = unit.list_reviewers(id).await?;

        Ok(pull_request.with_reviewers(reviewers))
    }
}

fn validate_new(input: &NewPullRequest) -> Result<(), AppError> {
    if input.id.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            "pull request id is required",
            "pull_request_id",
        ));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            "pull request name is required",
            "pull_request_name",
        ));
    }
    if input.author_id.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            "author id is required",
            "author_id",
        ));
    }
    Ok(())
}
