//! Data models for the application.
//!
//! These models represent the entities stored in the SQLite database.
//! Row types derive `FromRow` for SQLx queries; the HTTP layer converts them
//! into its own response shapes.

pub mod pull_request;
pub mod team;

// Re-exports for convenient access
pub use pull_request::{NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus};
pub use team::{Member, Team, User};
