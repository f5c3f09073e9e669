use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WorkflowError;

/// Role of an actor. Closed set; every role comparison goes through this type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No identity, or an identity whose role could not be established.
    #[default]
    Anonymous,
    User,
    Admin,
}

impl Role {
    /// Roles that may be assigned to an account.
    pub const ASSIGNABLE: &'static [Role] = &[Self::User, Self::Admin];

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Resolve an optional role claim.
    ///
    /// A missing role fails closed to [`Role::Anonymous`]; an unrecognized one
    /// is an error rather than a silent downgrade.
    pub fn resolve(claim: Option<&str>) -> Result<Self, WorkflowError> {
        match claim {
            None => Ok(Self::Anonymous),
            Some(name) => name.parse(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymous" => Ok(Self::Anonymous),
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(WorkflowError::InvalidRole(s.to_string())),
        }
    }
}
