use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use workflow::{Action, ActorId, AuthContext, Rating, Resource, ResourceId, ResourceStatus};

use crate::error::{ClientError, Result};

/// Identity reported by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<Identity> for AuthContext {
    fn from(identity: Identity) -> Self {
        AuthContext {
            id: Some(identity.id),
            role: identity.role,
            token: None,
        }
    }
}

/// Body of `POST /resources/{id}/review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub status: ResourceStatus,
    pub review_comment: String,
    pub reviewed_by: ActorId,
}

/// Body of `POST /resources/{id}/deactivate` and `/reactivate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub review_comment: String,
}

/// Body of `POST /resources/{id}/rating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub rating: Rating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    AverageRating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters of `GET /resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ActorId>,
    pub page: u32,
    pub per_page: u32,
    pub sort: SortField,
    pub order: SortOrder,
}

impl ListQuery {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamp paging to `page >= 1` and `1..=MAX_PER_PAGE` items per page.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        self
    }

    fn matches(&self, resource: &Resource) -> bool {
        self.status.is_none_or(|s| s == resource.status)
            && self.owner.as_ref().is_none_or(|o| o == &resource.owner)
    }

    /// Filter, sort and slice an in-memory collection the way the backend does.
    pub fn paginate(&self, items: impl IntoIterator<Item = Resource>) -> Page<Resource> {
        let query = self.clone().normalized();
        let mut matching: Vec<Resource> = items.into_iter().filter(|r| query.matches(r)).collect();

        matching.sort_by(|a, b| {
            let ordering = match query.sort {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Title => a.title.cmp(&b.title),
                SortField::AverageRating => a
                    .rating
                    .average_rating
                    .total_cmp(&b.rating.average_rating),
            }
            .then_with(|| a.id.cmp(&b.id));
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let offset = (u64::from(query.page) - 1).saturating_mul(u64::from(query.per_page));
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(query.per_page as usize)
            .collect();

        Page {
            items,
            page: query.page,
            per_page: query.per_page,
            total,
        }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            owner: None,
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as u64)
    }
}

/// The REST API that stores resources. Authoritative: every mutating call
/// returns the canonical resource, which replaces any local guess.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// `GET /auth/me`. `None` when the backend does not know the caller.
    async fn whoami(&self) -> Result<Option<Identity>>;

    async fn fetch(&self, id: &ResourceId) -> Result<Resource>;

    async fn list(&self, query: &ListQuery) -> Result<Page<Resource>>;

    async fn submit(&self, id: &ResourceId) -> Result<Resource>;

    async fn review(&self, id: &ResourceId, request: &ReviewRequest) -> Result<Resource>;

    async fn deactivate(&self, id: &ResourceId, request: &StatusChangeRequest) -> Result<Resource>;

    async fn reactivate(&self, id: &ResourceId, request: &StatusChangeRequest) -> Result<Resource>;

    async fn resubmit(&self, id: &ResourceId) -> Result<Resource>;

    async fn rate(&self, id: &ResourceId, request: &RatingRequest) -> Result<Resource>;

    async fn delete(&self, id: &ResourceId) -> Result<()>;

    /// Send the request matching an engine-approved transition.
    ///
    /// `next` is the engine's result; its review fields become the request body.
    async fn persist_transition(&self, action: Action, next: &Resource) -> Result<Resource> {
        let comment = next.review_comment().unwrap_or_default().to_string();
        match action {
            Action::Submit => self.submit(&next.id).await,
            Action::Resubmit => self.resubmit(&next.id).await,
            Action::Approve | Action::Reject => {
                let reviewed_by = next.reviewed_by().cloned().ok_or_else(|| {
                    ClientError::InvalidResponse("review transition produced no reviewer".into())
                })?;
                let request = ReviewRequest {
                    status: next.status,
                    review_comment: comment,
                    reviewed_by,
                };
                self.review(&next.id, &request).await
            }
            Action::Deactivate => {
                let request = StatusChangeRequest {
                    review_comment: comment,
                };
                self.deactivate(&next.id, &request).await
            }
            Action::Reactivate => {
                let request = StatusChangeRequest {
                    review_comment: comment,
                };
                self.reactivate(&next.id, &request).await
            }
        }
    }
}
