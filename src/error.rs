//! Application error types.
//!
//! These errors are serializable and are returned from every service call so
//! the HTTP layer can map them onto status codes without string matching.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the services.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A resource with the same identity already exists.
    #[error("Already exists: {resource} {id}")]
    AlreadyExists { resource: String, id: String },

    /// The pull request is merged and can no longer change.
    #[error("Pull request {pr_id} is already merged")]
    AlreadyMerged { pr_id: String },

    /// The reviewer to replace is not assigned to the pull request.
    #[error("Reviewer {reviewer_id} is not assigned to pull request {pr_id}")]
    NotAssigned { pr_id: String, reviewer_id: String },

    /// No active teammate is left to review.
    #[error("No eligible reviewers for pull request {pr_id}")]
    NoEligibleCandidates { pr_id: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },
}

impl AppError {
    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    pub fn already_exists(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn already_merged(pr_id: impl Into<String>) -> Self {
        Self::AlreadyMerged {
            pr_id: pr_id.into(),
        }
    }

    pub fn not_assigned(pr_id: impl Into<String>, reviewer_id: impl Into<String>) -> Self {
        Self::NotAssigned {
            pr_id: pr_id.into(),
            reviewer_id: reviewer_id.into(),
        }
    }

    pub fn no_eligible_candidates(pr_id: impl Into<String>) -> Self {
        Self::NoEligibleCandidates {
            pr_id: pr_id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}
