use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkflowError;
use crate::permissions::ActionSet;
use crate::role::Role;

/// Opaque identifier of a user account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity and role as handed over by the auth provider.
///
/// This is the untyped boundary: `role` is whatever string the provider sent.
/// Convert to an [`Actor`] before asking the engine anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub id: Option<String>,
    pub role: Option<String>,
    /// Bearer credential for authenticated backend calls.
    #[serde(skip)]
    pub token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Some(role.into()),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The `Authorization` header value, if a credential is present.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_deref().map(|t| format!("Bearer {t}"))
    }

    /// Resolve the typed actor.
    ///
    /// No identity is the anonymous actor, not an error. An identity with no
    /// role keeps its id but gets no capabilities.
    pub fn actor(&self) -> Result<Actor, WorkflowError> {
        let Some(id) = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(Actor::anonymous());
        };
        let role = Role::resolve(self.role.as_deref())?;
        Ok(Actor::new(id, role))
    }
}

/// A resolved, typed actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: Option<ActorId>,
    role: Role,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            role: Role::Anonymous,
        }
    }

    pub fn new(id: impl Into<ActorId>, role: Role) -> Self {
        Self {
            id: Some(id.into()),
            role,
        }
    }

    pub fn user(id: impl Into<ActorId>) -> Self {
        Self::new(id, Role::User)
    }

    pub fn admin(id: impl Into<ActorId>) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn id(&self) -> Option<&ActorId> {
        self.id.as_ref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> ActionSet {
        ActionSet::for_role(self.role)
    }

    /// Returns true if this actor is identified as `id`.
    pub fn is(&self, id: &ActorId) -> bool {
        self.id.as_ref() == Some(id)
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::anonymous()
    }
}
