//! Error types for greenhouse-core.
//!
//! This module defines all error types that can occur while talking to
//! the greenhouse backend and coordinating client state.
//!
//! # Recovery guide
//!
//! | Error | Strategy |
//! |-------|----------|
//! | [`Error::Unauthorized`] | Redirect to login; never auto-retry |
//! | [`Error::Api`] | Surface to the user; retry manually |
//! | [`Error::Http`] | Transient network failure; retry manually |
//! | [`Error::IncompleteSettings`] | Fill in the missing fields locally |
//! | [`Error::PasswordPolicy`] | Fix the password locally |
//! | [`Error::InvalidUrl`] | Fix configuration and restart |
//!
//! Validation errors are raised before any network call; transient
//! failures leave previously fetched state untouched, so every failure
//! path returns the caller to a consistent view.

use thiserror::Error;

use crate::password::PasswordIssue;

/// Errors that can occur in the greenhouse client engine.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error
/// variants in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The session token is missing, expired, or rejected by the
    /// backend. Callers should clear the session and return to login.
    #[error("Not authenticated or session expired")]
    Unauthorized,

    /// The backend returned a non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the status line.
        message: String,
    },

    /// HTTP transport failure (connection refused, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured backend URL is not usable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A threshold configuration is missing required fields.
    #[error("Settings incomplete, missing fields: {}", missing.join(", "))]
    IncompleteSettings {
        /// Names of the missing fields.
        missing: Vec<&'static str>,
    },

    /// A password does not satisfy the local policy.
    #[error("Password policy violated: {}", issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    PasswordPolicy {
        /// Each unmet policy requirement.
        issues: Vec<PasswordIssue>,
    },

    /// Password suggestion exhausted its attempt budget.
    #[error("Could not generate a policy-compliant password in {attempts} attempts")]
    PasswordSuggestion {
        /// Number of candidates tried.
        attempts: u32,
    },

    /// Failed to format a timestamp for a query parameter.
    #[error("Timestamp formatting failed: {0}")]
    TimeFormat(#[from] time::error::Format),
}

impl Error {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl(url.into())
    }

    /// Whether this error indicates a dead session.
    ///
    /// Used by callers to decide between "retry manually" and
    /// "redirect to login".
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Result type alias using greenhouse-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
