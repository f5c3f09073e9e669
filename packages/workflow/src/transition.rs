use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::actor::Actor;
use crate::error::WorkflowError;
use crate::resource::{Resource, Review};
use crate::status::{ResourceStatus, StorageStatus};

/// A requested status transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Owner marks a finished upload ready for review.
    Submit,
    Approve,
    Reject,
    Deactivate,
    Reactivate,
    /// Owner updates content, sending the resource back to review.
    Resubmit,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Self::Submit,
        Self::Approve,
        Self::Reject,
        Self::Deactivate,
        Self::Reactivate,
        Self::Resubmit,
    ];

    /// Status the resource ends up in.
    pub fn target(&self) -> ResourceStatus {
        match self {
            Self::Submit | Self::Resubmit => ResourceStatus::Pending,
            Self::Approve | Self::Reactivate => ResourceStatus::Approved,
            Self::Reject => ResourceStatus::Rejected,
            Self::Deactivate => ResourceStatus::Inactive,
        }
    }

    pub fn requires_comment(&self) -> bool {
        matches!(self, Self::Reject | Self::Deactivate)
    }

    /// Administrative actions act on someone else's resource and record a review.
    pub fn is_administrative(&self) -> bool {
        matches!(
            self,
            Self::Approve | Self::Reject | Self::Deactivate | Self::Reactivate
        )
    }

    fn allowed_from(&self, status: ResourceStatus) -> bool {
        match self {
            Self::Submit => status == ResourceStatus::Uploading,
            Self::Approve | Self::Reject => status.awaits_review(),
            Self::Deactivate => status == ResourceStatus::Approved,
            Self::Reactivate => status == ResourceStatus::Inactive,
            Self::Resubmit => status.is_resubmittable(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Deactivate => "deactivate",
            Self::Reactivate => "reactivate",
            Self::Resubmit => "resubmit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid action '{s}'. Valid values: {}",
                    Self::ALL
                        .iter()
                        .map(|a| a.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

fn normalize_comment(comment: Option<&str>) -> Option<&str> {
    comment.map(str::trim).filter(|c| !c.is_empty())
}

/// Check whether `actor` may apply `action` to `resource` with `comment`.
///
/// Checks run in a fixed order: comment requirement, status precondition,
/// capability, then the self-action guard. The first failure is returned.
pub fn check_transition(
    resource: &Resource,
    actor: &Actor,
    action: Action,
    comment: Option<&str>,
) -> Result<(), WorkflowError> {
    let result = run_checks(resource, actor, action, comment);
    if let Err(err) = &result {
        debug!(
            resource_id = %resource.id,
            action = %action,
            status = %resource.status,
            code = err.code(),
            "Transition rejected"
        );
    }
    result
}

fn run_checks(
    resource: &Resource,
    actor: &Actor,
    action: Action,
    comment: Option<&str>,
) -> Result<(), WorkflowError> {
    if action.requires_comment() && normalize_comment(comment).is_none() {
        return Err(WorkflowError::CommentRequired { action });
    }

    let sync_pending =
        action == Action::Submit && resource.storage_status != StorageStatus::Synced;
    if !action.allowed_from(resource.status) || sync_pending {
        return Err(WorkflowError::InvalidTransition {
            action,
            from: resource.status,
            to: action.target(),
        });
    }

    let perms = actor.permissions();
    let is_owner = actor.is(&resource.owner);
    // A review has to name its reviewer.
    let identified = actor.id().is_some();
    let permitted = match action {
        Action::Submit => perms.can_upload && is_owner,
        Action::Resubmit => perms.can_update_own && is_owner,
        Action::Approve | Action::Reject => perms.can_review && identified,
        Action::Deactivate | Action::Reactivate => perms.can_manage_status && identified,
    };
    if !permitted {
        return Err(WorkflowError::PermissionDenied {
            operation: action.as_str(),
        });
    }

    if action.is_administrative() && is_owner {
        return Err(WorkflowError::SelfActionForbidden {
            operation: action.as_str(),
        });
    }

    Ok(())
}

/// Apply `action` to a snapshot of `resource`, returning the next snapshot.
///
/// The input is never modified. `at` stamps the review and `updated_at`.
pub fn apply_transition(
    resource: &Resource,
    actor: &Actor,
    action: Action,
    comment: Option<&str>,
    at: DateTime<Utc>,
) -> Result<Resource, WorkflowError> {
    check_transition(resource, actor, action, comment)?;

    let mut next = resource.clone();
    next.status = action.target();
    next.updated_at = at;

    if action.is_administrative() {
        let reviewer = actor.id().ok_or(WorkflowError::PermissionDenied {
            operation: action.as_str(),
        })?;
        next.review = Some(Review {
            reviewed_by: reviewer.clone(),
            reviewed_at: at,
            comment: normalize_comment(comment).unwrap_or_default().to_string(),
        });
    } else if action == Action::Resubmit {
        next.review = None;
    }

    Ok(next)
}

/// Actions `actor` could apply to `resource` right now.
///
/// Comment-requiring actions are included when a comment would make them
/// legal; the caller prompts for it.
pub fn permitted_actions(resource: &Resource, actor: &Actor) -> Vec<Action> {
    Action::ALL
        .iter()
        .copied()
        .filter(|action| {
            let comment = action.requires_comment().then_some("-");
            run_checks(resource, actor, *action, comment).is_ok()
        })
        .collect()
}
