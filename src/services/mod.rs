//! Business logic services.
//!
//! The reviewer engine only talks to storage through the `ReviewerStore`
//! trait, so it is tested against an in-memory double and run against SQLite.

pub mod api;
pub mod pull_requests;
pub mod reviewer_engine;
pub mod server;
pub mod sqlite_store;
pub mod store;
pub mod teams;

pub use pull_requests::PullRequestService;
pub use reviewer_engine::ReviewerEngine;
pub use sqlite_store::SqliteStore;
pub use teams::TeamService;
