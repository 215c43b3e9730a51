//! Pull request model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of a pull request.
///
/// `Open` is the initial state and `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl From<&str> for PullRequestStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request together with its current reviewers.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PullRequest {
    /// Externally supplied identifier.
    pub id: String,

    pub name: String,

    /// Member who opened the pull request.
    pub author_id: String,

    /// Current state: `OPEN` or `MERGED`.
    pub status: String,

    /// Creation timestamp (Unix).
    pub created_at: i64,

    /// Merge timestamp (Unix, if merged).
    pub merged_at: Option<i64>,

    /// Reviewer IDs in assignment order. Loaded separately from `pr_reviewers`.
    #[sqlx(skip)]
    pub reviewers: Vec<String>,
}

impl PullRequest {
    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> PullRequestStatus {
        PullRequestStatus::from(self.status.as_str())
    }

    pub fn is_merged(&self) -> bool {
        self.status_enum() == PullRequestStatus::Merged
    }

    pub fn with_reviewers(mut self, reviewers: Vec<String>) -> Self {
        self.reviewers = reviewers;
        self
    }
}

/// Compact pull request listing used by a reviewer's queue.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PullRequestShort {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
}

/// Input for opening a pull request.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
}
