//! Pull request reviewer assignment service.
//!
//! Teams of users open pull requests; each new pull request gets up to two
//! active teammates of the author as reviewers. Reviewers can be swapped for
//! another teammate while the pull request is open, and merging freezes it.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
