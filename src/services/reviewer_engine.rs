//! Reviewer assignment and reassignment.
//!
//! The engine decides how many reviewers a pull request needs from the number
//! of active members in the author's team, picks them at random among active
//! teammates, and swaps a single reviewer for a fresh one on request.
//!
//! Selection draws random teammates and rejects the author and anyone already
//! assigned. Draws are capped at `max_draws`; once the cap is hit the eligible
//! set is computed once and the remaining slots are sampled from it without
//! replacement, so selection always terminates.

use crate::error::AppError;
use crate::models::PullRequest;
use crate::services::store::ReviewerUnit;
use rand::seq::SliceRandom;

/// Default cap on random draws per selection.
pub const DEFAULT_MAX_DRAWS: usize = 16;

/// Number of reviewers a pull request needs for a team with `active_count`
/// active members, the author included.
pub fn required_reviewers(active_count: i64) -> usize {
    match active_count {
        i64::MIN..=1 => 0,
        2 => 1,
        _ => 2,
    }
}

/// Outcome of a reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub pull_request: PullRequest,
    /// The freshly assigned reviewer, or `None` if the team had nobody to spare.
    pub replaced_by: Option<String>,
}

/// Reviewer selection engine. Stateless apart from its draw budget.
#[derive(Debug, Clone)]
pub struct ReviewerEngine {
    max_draws: usize,
}

impl Default for ReviewerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DRAWS)
    }
}

impl ReviewerEngine {
    pub fn new(max_draws: usize) -> Self {
        Self { max_draws }
    }

    /// Assign the initial reviewers of a freshly inserted pull request.
    ///
    /// Runs inside the caller's unit; nothing is visible until it commits.
    pub async fn assign_initial_reviewers(
        &self,
        unit: &mut dyn ReviewerUnit,
        pull_request: PullRequest,
    ) -> Result<PullRequest, AppError> {
        let active_count = unit.count_active_teammates(&pull_request.author_id).await?;
        let needed = required_reviewers(active_count);

        log::debug!(
            "[engine] {} needs {} reviewer(s), {} active in team",
            pull_request.id,
            needed,
            active_count
        );

        let mut assigned = Vec::with_capacity(needed);
        if needed > 0 {
            let picked = self.select(unit, &pull_request, &[], needed).await?;
            for reviewer in picked {
                unit.insert_reviewer_link(&pull_request.id, &reviewer).await?;
                assigned.push(reviewer);
            }
        }

        log::info!("[engine] Assigned {:?} to {}", assigned, pull_request.id);

        Ok(pull_request.with_reviewers(assigned))
    }

    /// Replace `old_reviewer_id` with a reviewer not yet on the pull request.
    ///
    /// When the team has no active member left besides the author and the
    /// current reviewers, nothing changes and `replaced_by` is `None`.
    pub async fn reassign_reviewer(
        &self,
        unit: &mut dyn ReviewerUnit,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        let pull_request = unit
            .get_pull_request(pr_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id))?;
        let current = unit.list_reviewers(pr_id).await?;

        // Someone besides the author and the current reviewers must be active.
        // Inactive reviewers still on the PR do not count against the team.
        let author = pull_request.author_id.as_str();
        let spare = unit
            .list_active_teammates(author)
            .await?
            .into_iter()
            .filter(|id| id != author && !current.contains(id))
            .count();
        if spare == 0 {
            log::info!(
                "[engine] No spare reviewer for {} ({} assigned), keeping {:?}",
                pr_id,
                current.len(),
                current
            );
            return Ok(Reassignment {
                pull_request: pull_request.with_reviewers(current),
                replaced_by: None,
            });
        }

        if !current.iter().any(|id| id == old_reviewer_id) {
            return Err(AppError::not_assigned(pr_id, old_reviewer_id));
        }

        let replacement = self
            .select(unit, &pull_request, &current, 1)
            .await?
            .pop()
            .ok_or_else(|| AppError::no_eligible_candidates(pr_id))?;

        unit.insert_reviewer_link(pr_id, &replacement).await?;
        unit.delete_reviewer_link(pr_id, old_reviewer_id).await?;

        let reviewers = unit.list_reviewers(pr_id).await?;

        log::info!(
            "[engine] Replaced {} with {} on {}",
            old_reviewer_id,
            replacement,
            pr_id
        );

        Ok(Reassignment {
            pull_request: pull_request.with_reviewers(reviewers),
            replaced_by: Some(replacement),
        })
    }

    /// Pick `needed` distinct active teammates of the author, excluding the
    /// author and everyone in `taken`.
    async fn select(
        &self,
        unit: &mut dyn ReviewerUnit,
        pull_request: &PullRequest,
        taken: &[String],
        needed: usize,
    ) -> Result<Vec<String>, AppError> {
        let author = pull_request.author_id.as_str();
        let is_excluded = |id: &str, picked: &[String]| {
            id == author || taken.iter().chain(picked).any(|t| t == id)
        };

        let mut picked: Vec<String> = Vec::with_capacity(needed);
        let mut draws = 0;

        while picked.len() < needed && draws < self.max_draws {
            draws += 1;
            let candidate = match unit.draw_active_teammate(author).await {
                Ok(candidate) => candidate,
                Err(AppError::NoEligibleCandidates { .. }) => {
                    return Err(AppError::no_eligible_candidates(&pull_request.id));
                }
                Err(e) => return Err(e),
            };
            if !is_excluded(candidate.as_str(), picked.as_slice()) {
                picked.push(candidate);
            }
        }

        if picked.len() == needed {
            return Ok(picked);
        }

        log::debug!(
            "[engine] Draw budget of {} spent for {}, sampling from eligible set",
            self.max_draws,
            pull_request.id
        );

        let eligible: Vec<String> = unit
            .list_active_teammates(author)
            .await?
            .into_iter()
            .filter(|id| !is_excluded(id.as_str(), picked.as_slice()))
            .collect();

        let remaining = needed - picked.len();
        if eligible.len() < remaining {
            log::warn!(
                "[engine] Only {} eligible reviewer(s) left for {}, {} needed",
                eligible.len(),
                pull_request.id,
                remaining
            );
            return Err(AppError::no_eligible_candidates(&pull_request.id));
        }

        let sampled: Vec<String> = {
            let mut rng = rand::thread_rng();
            eligible
                .choose_multiple(&mut rng, remaining)
                .cloned()
                .collect()
        };
        picked.extend(sampled);

        Ok(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPullRequest;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};

    /// In-memory unit with a scripted draw sequence.
    #[derive(Default)]
    struct ScriptedUnit {
        teams: HashMap<String, Vec<(String, bool)>>,
        pull_requests: HashMap<String, PullRequest>,
        links: Vec<(String, String)>,
        draws: VecDeque<String>,
        draw_calls: usize,
    }

    impl ScriptedUnit {
        fn with_team(members: &[(&str, bool)]) -> Self {
            let mut unit = Self::default();
            unit.teams.insert(
                "core".into(),
                members.iter().map(|(id, a)| (id.to_string(), *a)).collect(),
            );
            unit
        }

        fn open_pr(&mut self, id: &str, author: &str) -> PullRequest {
            let pr = PullRequest {
                id: id.into(),
                name: format!("{} title", id),
                author_id: author.into(),
                status: "OPEN".into(),
                created_at: 1_700_000_000,
                merged_at: None,
                reviewers: vec![],
            };
            self.pull_requests.insert(id.into(), pr.clone());
            pr
        }

        fn active_of(&self, member_id: &str) -> Vec<String> {
            self.teams
                .values()
                .find(|m| m.iter().any(|(id, _)| id == member_id))
                .map(|m| m.iter().filter(|(_, a)| *a).map(|(id, _)| id.clone()).collect())
                .unwrap_or_default()
        }

        fn reviewers_of(&self, pr_id: &str) -> Vec<String> {
            self.links
                .iter()
                .filter(|(p, _)| p == pr_id)
                .map(|(_, u)| u.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ReviewerUnit for ScriptedUnit {
        async fn get_pull_request(&mut self, id: &str) -> Result<Option<PullRequest>, AppError> {
            Ok(self.pull_requests.get(id).cloned())
        }

        async fn member_exists(&mut self, member_id: &str) -> Result<bool, AppError> {
            Ok(self
                .teams
                .values()
                .any(|m| m.iter().any(|(id, _)| id == member_id)))
        }

        async fn insert_pull_request(
            &mut self,
            input: &NewPullRequest,
            created_at: i64,
        ) -> Result<PullRequest, AppError> {
            let mut pr = self.open_pr(&input.id, &input.author_id);
            pr.created_at = created_at;
            Ok(pr)
        }

        async fn mark_merged(&mut self, id: &str, merged_at: i64) -> Result<PullRequest, AppError> {
            let pr = self
                .pull_requests
                .get_mut(id)
                .ok_or_else(|| AppError::not_found_with_id("PullRequest", id))?;
            pr.status = "MERGED".into();
            pr.merged_at = Some(merged_at);
            Ok(pr.clone())
        }

        async fn count_active_teammates(&mut self, member_id: &str) -> Result<i64, AppError> {
            Ok(self.active_of(member_id).len() as i64)
        }

        async fn draw_active_teammate(&mut self, member_id: &str) -> Result<String, AppError> {
            self.draw_calls += 1;
            if let Some(next) = self.draws.pop_front() {
                return Ok(next);
            }
            self.active_of(member_id)
                .first()
                .cloned()
                .ok_or_else(|| AppError::no_eligible_candidates(""))
        }

        async fn list_active_teammates(
            &mut self,
            member_id: &str,
        ) -> Result<Vec<String>, AppError> {
            Ok(self.active_of(member_id))
        }

        async fn insert_reviewer_link(
            &mut self,
            pr_id: &str,
            member_id: &str,
        ) -> Result<(), AppError> {
            if self.links.iter().any(|(p, u)| p == pr_id && u == member_id) {
                return Err(AppError::database("UNIQUE constraint failed"));
            }
            self.links.push((pr_id.into(), member_id.into()));
            Ok(())
        }

        async fn delete_reviewer_link(
            &mut self,
            pr_id: &str,
            member_id: &str,
        ) -> Result<(), AppError> {
            self.links.retain(|(p, u)| !(p == pr_id && u == member_id));
            Ok(())
        }

        async fn list_reviewers(&mut self, pr_id: &str) -> Result<Vec<String>, AppError> {
            Ok(self.reviewers_of(pr_id))
        }

        async fn commit(self: Box<Self>) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[test]
    fn test_required_reviewers_boundaries() {
        assert_eq!(required_reviewers(0), 0);
        assert_eq!(required_reviewers(1), 0);
        assert_eq!(required_reviewers(2), 1);
        assert_eq!(required_reviewers(3), 2);
        assert_eq!(required_reviewers(12), 2);
    }

    #[tokio::test]
    async fn test_rejected_draws_are_skipped() {
        let mut unit = ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true)]);
        // author, then a duplicate, then the two valid picks
        unit.draws = VecDeque::from(vec!["a".into(), "b".into(), "b".into(), "c".into()]);
        let pr = unit.open_pr("pr-1", "a");

        let pr = ReviewerEngine::default()
            .assign_initial_reviewers(&mut unit, pr)
            .await
            .unwrap();

        assert_eq!(pr.reviewers, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(unit.reviewers_of("pr-1"), pr.reviewers);
        assert_eq!(unit.draw_calls, 4);
    }

    #[tokio::test]
    async fn test_exhausted_draw_budget_falls_back_to_eligible_set() {
        let mut unit = ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true)]);
        // Every draw hands back the author
        unit.draws = std::iter::repeat("a".to_string()).take(64).collect();
        let pr = unit.open_pr("pr-1", "a");

        let pr = ReviewerEngine::new(5)
            .assign_initial_reviewers(&mut unit, pr)
            .await
            .unwrap();

        assert_eq!(unit.draw_calls, 5);
        let mut reviewers = pr.reviewers.clone();
        reviewers.sort();
        assert_eq!(reviewers, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_fails_fast_when_no_eligible_candidate_remains() {
        // Count says three active, but the draws and the eligible set only
        // ever offer the author: the last teammates went inactive mid-flight.
        let mut unit = ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true)]);
        unit.draws = std::iter::repeat("a".to_string()).take(64).collect();
        let pr = unit.open_pr("pr-1", "a");
        unit.links.push(("pr-1".into(), "b".into()));
        unit.links.push(("pr-1".into(), "c".into()));

        let result = ReviewerEngine::new(3)
            .select(&mut unit, &pr, &["b".to_string(), "c".to_string()], 1)
            .await;

        assert!(matches!(
            result,
            Err(AppError::NoEligibleCandidates { ref pr_id }) if pr_id == "pr-1"
        ));
    }

    #[tokio::test]
    async fn test_single_active_member_gets_no_reviewers() {
        let mut unit = ScriptedUnit::with_team(&[("a", true), ("b", false)]);
        let pr = unit.open_pr("pr-1", "a");

        let pr = ReviewerEngine::default()
            .assign_initial_reviewers(&mut unit, pr)
            .await
            .unwrap();

        assert!(pr.reviewers.is_empty());
        assert_eq!(unit.draw_calls, 0);
    }

    #[tokio::test]
    async fn test_reassign_swaps_exactly_one_reviewer() {
        let mut unit =
            ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true), ("d", true)]);
        unit.open_pr("pr-1", "a");
        unit.links.push(("pr-1".into(), "b".into()));
        unit.links.push(("pr-1".into(), "c".into()));
        unit.draws = VecDeque::from(vec!["c".into(), "a".into(), "d".into()]);

        let outcome = ReviewerEngine::default()
            .reassign_reviewer(&mut unit, "pr-1", "b")
            .await
            .unwrap();

        assert_eq!(outcome.replaced_by.as_deref(), Some("d"));
        assert_eq!(
            outcome.pull_request.reviewers,
            vec!["c".to_string(), "d".to_string()]
        );
    }

    #[tokio::test]
    async fn test_reassign_without_spare_member_is_noop() {
        let mut unit = ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true)]);
        unit.open_pr("pr-1", "a");
        unit.links.push(("pr-1".into(), "b".into()));
        unit.links.push(("pr-1".into(), "c".into()));

        let outcome = ReviewerEngine::default()
            .reassign_reviewer(&mut unit, "pr-1", "b")
            .await
            .unwrap();

        assert_eq!(outcome.replaced_by, None);
        assert_eq!(
            outcome.pull_request.reviewers,
            vec!["b".to_string(), "c".to_string()]
        );
        assert_eq!(unit.draw_calls, 0);
    }

    #[tokio::test]
    async fn test_reassign_replaces_inactive_reviewer() {
        let mut unit =
            ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true), ("d", false)]);
        unit.open_pr("pr-1", "a");
        unit.links.push(("pr-1".into(), "d".into()));
        unit.links.push(("pr-1".into(), "b".into()));

        let outcome = ReviewerEngine::default()
            .reassign_reviewer(&mut unit, "pr-1", "d")
            .await
            .unwrap();

        assert_eq!(outcome.replaced_by.as_deref(), Some("c"));
        assert_eq!(
            outcome.pull_request.reviewers,
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_reassign_with_inactive_author_still_finds_spare() {
        let mut unit =
            ScriptedUnit::with_team(&[("a", false), ("b", true), ("c", true), ("d", true)]);
        unit.open_pr("pr-1", "a");
        unit.links.push(("pr-1".into(), "b".into()));
        unit.links.push(("pr-1".into(), "c".into()));

        let outcome = ReviewerEngine::default()
            .reassign_reviewer(&mut unit, "pr-1", "b")
            .await
            .unwrap();

        assert_eq!(outcome.replaced_by.as_deref(), Some("d"));
    }

    #[tokio::test]
    async fn test_reassign_rejects_unassigned_reviewer() {
        let mut unit =
            ScriptedUnit::with_team(&[("a", true), ("b", true), ("c", true), ("d", true)]);
        unit.open_pr("pr-1", "a");
        unit.links.push(("pr-1".into(), "b".into()));

        let result = ReviewerEngine::default()
            .reassign_reviewer(&mut unit, "pr-1", "c")
            .await;

        assert!(matches!(result, Err(AppError::NotAssigned { .. })));
        assert_eq!(unit.reviewers_of("pr-1"), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_reassign_unknown_pull_request() {
        let mut unit = ScriptedUnit::with_team(&[("a", true)]);

        let result = ReviewerEngine::default()
            .reassign_reviewer(&mut unit, "missing", "b")
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
