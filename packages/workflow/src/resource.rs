use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::ActorId;
use crate::status::{ResourceStatus, StorageStatus};

/// Opaque identifier of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Outcome of the most recent review transition.
///
/// The three review fields only ever exist together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewed_by: ActorId,
    pub reviewed_at: DateTime<Utc>,
    pub comment: String,
}

/// Backend-maintained rating aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub rating_count: u32,
    pub average_rating: f64,
}

/// Snapshot of an uploaded resource.
///
/// On the wire the review is flattened into `review_comment`, `reviewed_by`
/// and `reviewed_at`; deserialization rejects records where only some of them
/// are present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResourceRecord", into = "ResourceRecord")]
pub struct Resource {
    pub id: ResourceId,
    pub owner: ActorId,
    pub status: ResourceStatus,
    pub storage_status: StorageStatus,
    pub title: String,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub review: Option<Review>,
    pub rating: RatingAggregate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// A freshly created upload: `uploading`, storage not yet synced.
    pub fn new(
        id: impl Into<ResourceId>,
        owner: impl Into<ActorId>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            status: ResourceStatus::Uploading,
            storage_status: StorageStatus::Pending,
            title: title.into(),
            description: None,
            file_name: None,
            file_size: None,
            review: None,
            rating: RatingAggregate::default(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_storage_status(mut self, storage_status: StorageStatus) -> Self {
        self.storage_status = storage_status;
        self
    }

    /// Merge the aggregate returned by the backend after a rating.
    pub fn with_rating(mut self, rating: RatingAggregate) -> Self {
        self.rating = rating;
        self
    }

    pub fn review_comment(&self) -> Option<&str> {
        self.review.as_ref().map(|r| r.comment.as_str())
    }

    pub fn reviewed_by(&self) -> Option<&ActorId> {
        self.review.as_ref().map(|r| &r.reviewed_by)
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.review.as_ref().map(|r| r.reviewed_at)
    }
}

/// Flat wire representation of [`Resource`].
#[derive(Serialize, Deserialize)]
struct ResourceRecord {
    id: ResourceId,
    owner: ActorId,
    status: ResourceStatus,
    storage_status: StorageStatus,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    review_comment: Option<String>,
    #[serde(default)]
    reviewed_by: Option<ActorId>,
    #[serde(default)]
    reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    rating_count: u32,
    #[serde(default)]
    average_rating: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRecord> for Resource {
    type Error = String;

    fn try_from(record: ResourceRecord) -> Result<Self, Self::Error> {
        let review = match (record.reviewed_by, record.reviewed_at) {
            (Some(reviewed_by), Some(reviewed_at)) => Some(Review {
                reviewed_by,
                reviewed_at,
                comment: record.review_comment.unwrap_or_default(),
            }),
            (None, None) if record.review_comment.is_none() => None,
            _ => {
                return Err(format!(
                    "resource {}: review_comment, reviewed_by and reviewed_at must be set together",
                    record.id
                ));
            }
        };

        Ok(Self {
            id: record.id,
            owner: record.owner,
            status: record.status,
            storage_status: record.storage_status,
            title: record.title,
            description: record.description,
            file_name: record.file_name,
            file_size: record.file_size,
            review,
            rating: RatingAggregate {
                rating_count: record.rating_count,
                average_rating: record.average_rating,
            },
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl From<Resource> for ResourceRecord {
    fn from(resource: Resource) -> Self {
        let (review_comment, reviewed_by, reviewed_at) = match resource.review {
            Some(review) => (
                Some(review.comment),
                Some(review.reviewed_by),
                Some(review.reviewed_at),
            ),
            None => (None, None, None),
        };

        Self {
            id: resource.id,
            owner: resource.owner,
            status: resource.status,
            storage_status: resource.storage_status,
            title: resource.title,
            description: resource.description,
            file_name: resource.file_name,
            file_size: resource.file_size,
            review_comment,
            reviewed_by,
            reviewed_at,
            rating_count: resource.rating.rating_count,
            average_rating: resource.rating.average_rating,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}
