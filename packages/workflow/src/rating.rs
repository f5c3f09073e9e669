use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::error::WorkflowError;
use crate::permissions::can_view;
use crate::resource::Resource;

/// A validated star rating in `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, WorkflowError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(WorkflowError::InvalidRating(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = WorkflowError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Validate a rating before it is sent to the backend.
///
/// The range is checked before the actor's capability. The aggregate is not
/// recomputed here; merge the backend's answer with [`Resource::with_rating`].
/// Owners may rate their own resources.
pub fn apply_rating(
    resource: &Resource,
    actor: &Actor,
    value: u8,
) -> Result<Rating, WorkflowError> {
    let rating = Rating::new(value)?;
    if !actor.permissions().can_rate || !can_view(resource, actor) {
        return Err(WorkflowError::PermissionDenied { operation: "rate" });
    }
    Ok(rating)
}
