use serde::{Deserialize, Serialize};

use crate::actor::{Actor, AuthContext};
use crate::error::WorkflowError;
use crate::resource::Resource;
use crate::role::Role;
use crate::status::ResourceStatus;

/// Capabilities granted to a role.
///
/// `*_own` capabilities apply to resources the actor owns; administrators
/// additionally act on everyone's resources through the review and
/// status-management capabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSet {
    pub can_upload: bool,
    pub can_download: bool,
    pub can_rate: bool,
    pub can_update_own: bool,
    pub can_delete_own: bool,
    pub can_review: bool,
    pub can_manage_status: bool,
    pub can_see_all_statuses: bool,
    pub can_manage_users: bool,
}

impl ActionSet {
    pub const NONE: ActionSet = ActionSet {
        can_upload: false,
        can_download: false,
        can_rate: false,
        can_update_own: false,
        can_delete_own: false,
        can_review: false,
        can_manage_status: false,
        can_see_all_statuses: false,
        can_manage_users: false,
    };

    pub const USER: ActionSet = ActionSet {
        can_upload: true,
        can_download: true,
        can_rate: true,
        can_update_own: true,
        can_delete_own: true,
        ..Self::NONE
    };

    pub const ADMIN: ActionSet = ActionSet {
        can_review: true,
        can_manage_status: true,
        can_see_all_statuses: true,
        can_manage_users: true,
        ..Self::USER
    };

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Anonymous => Self::NONE,
            Role::User => Self::USER,
            Role::Admin => Self::ADMIN,
        }
    }
}

/// Derive the capability set for whoever the auth provider says is acting.
///
/// Fails only when the provider reports a role this system does not know.
pub fn derive_permissions(ctx: &AuthContext) -> Result<ActionSet, WorkflowError> {
    ctx.actor().map(|actor| actor.permissions())
}

/// Returns true if `actor` may see `resource` at all.
pub fn can_view(resource: &Resource, actor: &Actor) -> bool {
    if actor.permissions().can_see_all_statuses || resource.status.is_public() {
        return true;
    }
    actor.is(&resource.owner)
}

/// Statuses of other people's resources that `actor` may list.
pub fn visible_statuses(actor: &Actor) -> &'static [ResourceStatus] {
    if actor.permissions().can_see_all_statuses {
        ResourceStatus::ALL
    } else {
        &[ResourceStatus::Approved]
    }
}

/// Deletion is outside the status machine: the owner or an administrator.
pub fn authorize_delete(resource: &Resource, actor: &Actor) -> Result<(), WorkflowError> {
    let perms = actor.permissions();
    let as_owner = perms.can_delete_own && actor.is(&resource.owner);
    let as_admin = actor.role().is_admin();
    if as_owner || as_admin {
        Ok(())
    } else {
        Err(WorkflowError::PermissionDenied {
            operation: "delete",
        })
    }
}

/// Downloading needs the capability, visibility, and a synced blob.
pub fn authorize_download(resource: &Resource, actor: &Actor) -> Result<(), WorkflowError> {
    if !actor.permissions().can_download || !can_view(resource, actor) {
        return Err(WorkflowError::PermissionDenied {
            operation: "download",
        });
    }
    if !resource.storage_status.is_synced() {
        return Err(WorkflowError::StorageUnavailable(resource.storage_status));
    }
    Ok(())
}
