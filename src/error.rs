//! Error types for the GitHub client and the bulk action coordinator.

use thiserror::Error;

/// Errors returned by [`crate::github::GitHubClient`].
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API request failed ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid repository name {0:?}, expected owner/repo")]
    InvalidFullName(String),

    #[error("Invalid token format")]
    InvalidToken,
}

impl GitHubError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            GitHubError::AuthRequired | GitHubError::InvalidToken => true,
            GitHubError::Status { status, .. } => status.as_u16() == 401,
            _ => false,
        }
    }
}

/// Errors raised before a bulk action reaches the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BulkError {
    #[error("No repositories selected")]
    EmptySelection,

    #[error("A confirmation is already pending")]
    AlreadyOpen,

    #[error("Nothing to confirm")]
    NotOpen,
}

pub type Result<T, E = GitHubError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_covers_401_and_missing_token() {
        assert!(GitHubError::AuthRequired.is_unauthorized());
        let status = GitHubError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(status.is_unauthorized());
        let not_found = GitHubError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: "Not Found".into(),
        };
        assert!(!not_found.is_unauthorized());
        assert!(!GitHubError::InvalidFullName("x".into()).is_unauthorized());
    }
}
