//! Resource lifecycle and permission rules.
//!
//! Everything here is pure and synchronous: functions take immutable
//! snapshots and return new values. Persisting the result is the caller's job.

pub mod account;
pub mod actor;
pub mod error;
pub mod permissions;
pub mod rating;
pub mod resource;
pub mod role;
pub mod status;
pub mod transition;

pub use account::{Account, AccountAction, apply_role_change, authorize_account_action};
pub use actor::{Actor, ActorId, AuthContext};
pub use error::{ErrorKind, WorkflowError};
pub use permissions::{
    ActionSet, authorize_delete, authorize_download, can_view, derive_permissions,
    visible_statuses,
};
pub use rating::{Rating, apply_rating};
pub use resource::{RatingAggregate, Resource, ResourceId, Review};
pub use role::Role;
pub use status::{ParseStatusError, ResourceStatus, StorageStatus};
pub use transition::{Action, apply_transition, check_transition, permitted_actions};
