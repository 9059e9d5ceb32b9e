use std::io;
use thiserror::Error;

/// Core error type for branchdiff.
#[derive(Error, Debug)]
pub enum BranchDiffError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("git error: {message}")]
    Git { message: String },

    #[error("diff source unavailable: {message}")]
    DiffSourceUnavailable { message: String },

    #[error("base branch not found for '{branch}'")]
    BaseBranchNotFound { branch: String },

    #[error("malformed hunk header '{header}'")]
    MalformedHunk { header: String },
}

impl BranchDiffError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::DiffSourceUnavailable {
            message: message.into(),
        }
    }

    /// Returns true if the report should degrade to the "Base branch not
    /// found" message instead of failing.
    pub fn is_missing_base(&self) -> bool {
        matches!(
            self,
            Self::BaseBranchNotFound { .. } | Self::DiffSourceUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BranchDiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = BranchDiffError::config("bad value");
        assert_eq!(err.to_string(), "config error: bad value");
    }

    #[test]
    fn base_branch_not_found_display() {
        let err = BranchDiffError::BaseBranchNotFound {
            branch: "feature".into(),
        };
        assert_eq!(err.to_string(), "base branch not found for 'feature'");
    }

    #[test]
    fn missing_base_classification() {
        assert!(BranchDiffError::unavailable("not a repo").is_missing_base());
        assert!(BranchDiffError::BaseBranchNotFound {
            branch: "x".into()
        }
        .is_missing_base());
        let git = BranchDiffError::Git {
            message: "exit 128".into(),
        };
        assert!(!git.is_missing_base());
    }
}
