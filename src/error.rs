//! Error types
//!
//! Resolution, execution and wait failures each get their own enum so the
//! batch executor can tell a fail-fast error (resolution, validation) from a
//! per-item one (remote call, wait) and keep the latter in the item's slot.

use thiserror::Error;

use crate::resolver::ResourceKind;

/// Failure reported by the remote API collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("API request failed: {status} {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },
    /// The request never got a response
    #[error("failed to send request: {0}")]
    Transport(String),
    /// The response body did not have the expected shape
    #[error("failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, if the API answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to turn a user token into exactly one canonical identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("nothing found matching '{token}'")]
    NotFound { token: String },

    #[error(
        "'{token}' is ambiguous, found multiple matches: {}. Use the UUID to specify",
        candidates.join(", ")
    )]
    Ambiguous {
        token: String,
        candidates: Vec<String>,
    },

    #[error("{kind} cache is not initialized")]
    NotCached { kind: ResourceKind },

    #[error("failed to list {kind}s: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: ApiError,
    },
}

/// Terminal failure of a state wait
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("resource entered failure state {0}")]
    Failed(String),

    #[error("timed out waiting for state {0}")]
    TimedOut(String),

    #[error("wait cancelled")]
    Cancelled,
}

/// Failure of a single item inside a batch. Siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("{token}: {source}")]
    Remote {
        token: String,
        #[source]
        source: ApiError,
    },

    #[error("{token}: {source}")]
    Wait {
        token: String,
        #[source]
        source: WaitError,
    },

    #[error("{token}: task aborted: {reason}")]
    Aborted { token: String, reason: String },
}

impl ItemError {
    /// Token the failing item was requested with
    pub fn token(&self) -> &str {
        match self {
            Self::Remote { token, .. } | Self::Wait { token, .. } | Self::Aborted { token, .. } => {
                token
            }
        }
    }
}

/// Failure that aborts a whole batch before any mutation is sent
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to read confirmation: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Top level error of the binary, mapped to a process exit code
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("{failed} of {total} actions failed")]
    PartialFailure { failed: usize, total: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_)
            | Self::Batch(BatchError::Validation(_))
            | Self::Batch(BatchError::Resolve(_)) => 2,
            Self::Batch(BatchError::Cancelled) => 1,
            Self::PartialFailure { .. } => 4,
            Self::Batch(BatchError::Prompt(_)) | Self::Other(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_error_messages() {
        assert_eq!(
            WaitError::Failed("error".to_string()).to_string(),
            "resource entered failure state error"
        );
        assert_eq!(
            WaitError::TimedOut("started".to_string()).to_string(),
            "timed out waiting for state started"
        );
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = ResolveError::Ambiguous {
            token: "web".to_string(),
            candidates: vec!["a".to_string(), "b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'web'"));
        assert!(msg.contains("a, b"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("x").exit_code(), 2);
        assert_eq!(
            CliError::Batch(BatchError::Resolve(ResolveError::NotFound {
                token: "x".to_string()
            }))
            .exit_code(),
            2
        );
        assert_eq!(CliError::Batch(BatchError::Cancelled).exit_code(), 1);
        assert_eq!(
            CliError::PartialFailure {
                failed: 1,
                total: 3
            }
            .exit_code(),
            4
        );
    }
}
