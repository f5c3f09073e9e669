use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId};
use crate::error::WorkflowError;
use crate::role::Role;

/// A user account as shown on the user-management screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: ActorId,
    pub username: String,
    pub role: Role,
}

/// Administrative operations on an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountAction {
    ChangeRole(Role),
    Delete,
}

impl AccountAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChangeRole(_) => "change_role",
            Self::Delete => "delete_account",
        }
    }
}

/// Only user managers may administer accounts, and never their own.
pub fn authorize_account_action(
    actor: &Actor,
    target: &Account,
    action: AccountAction,
) -> Result<(), WorkflowError> {
    if !actor.permissions().can_manage_users {
        return Err(WorkflowError::PermissionDenied {
            operation: action.as_str(),
        });
    }
    if actor.is(&target.id) {
        return Err(WorkflowError::SelfActionForbidden {
            operation: action.as_str(),
        });
    }
    match action {
        AccountAction::ChangeRole(role) if !Role::ASSIGNABLE.contains(&role) => {
            Err(WorkflowError::InvalidRole(role.to_string()))
        }
        _ => Ok(()),
    }
}

/// Return `account` with its role replaced.
pub fn apply_role_change(
    account: &Account,
    actor: &Actor,
    role: Role,
) -> Result<Account, WorkflowError> {
    authorize_account_action(actor, account, AccountAction::ChangeRole(role))?;
    Ok(Account {
        role,
        ..account.clone()
    })
}
