use thiserror::Error;

use crate::status::{ResourceStatus, StorageStatus};
use crate::transition::Action;

/// A business-rule violation reported by the engine.
///
/// These are expected outcomes, returned as values. Callers translate them
/// into user-facing messages via [`WorkflowError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Invalid role '{0}'. Valid values: user, admin")]
    InvalidRole(String),

    #[error("Cannot {action} a resource that is {from} (target status: {to})")]
    InvalidTransition {
        action: Action,
        from: ResourceStatus,
        to: ResourceStatus,
    },

    #[error("Permission denied: {operation}")]
    PermissionDenied { operation: &'static str },

    #[error("A comment is required to {action} a resource")]
    CommentRequired { action: Action },

    #[error("Cannot {operation} your own record")]
    SelfActionForbidden { operation: &'static str },

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Resource file is not available (storage status: {0})")]
    StorageUnavailable(StorageStatus),
}

/// Discriminant of [`WorkflowError`] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRole,
    InvalidTransition,
    PermissionDenied,
    CommentRequired,
    SelfActionForbidden,
    InvalidRating,
    StorageUnavailable,
}

impl ErrorKind {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRole => "INVALID_ROLE",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::CommentRequired => "COMMENT_REQUIRED",
            Self::SelfActionForbidden => "SELF_ACTION_FORBIDDEN",
            Self::InvalidRating => "INVALID_RATING",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
        }
    }
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRole(_) => ErrorKind::InvalidRole,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::CommentRequired { .. } => ErrorKind::CommentRequired,
            Self::SelfActionForbidden { .. } => ErrorKind::SelfActionForbidden,
            Self::InvalidRating(_) => ErrorKind::InvalidRating,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
