use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, instrument};
use workflow::{
    Action, Actor, ActorId, AuthContext, RatingAggregate, Resource, ResourceId, ResourceStatus,
    WorkflowError, apply_rating, apply_transition, authorize_delete, can_view,
};

use crate::backend::{
    Identity, ListQuery, Page, RatingRequest, ResourceBackend, ReviewRequest, StatusChangeRequest,
};
use crate::error::{ClientError, ErrorBody, Result};

#[derive(Default)]
struct Store {
    resources: DashMap<ResourceId, Resource>,
    ratings: DashMap<(ResourceId, ActorId), u8>,
    failures: Mutex<VecDeque<u16>>,
    mutations: AtomicUsize,
}

/// In-process [`ResourceBackend`] that enforces the workflow rules itself.
///
/// Handles created with [`MemoryBackend::connect_as`] share one store, so
/// several actors can work on the same resources.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Store>,
    identity: Option<Identity>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Another handle on the same store, acting as `identity`.
    pub fn connect_as(&self, identity: Option<Identity>) -> Self {
        Self {
            store: Arc::clone(&self.store),
            identity,
        }
    }

    pub fn insert(&self, resource: Resource) {
        self.store.resources.insert(resource.id.clone(), resource);
    }

    pub fn get(&self, id: &ResourceId) -> Option<Resource> {
        self.store.resources.get(id).map(|r| r.value().clone())
    }

    /// Make the next mutating request fail with `status`.
    pub fn fail_next(&self, status: u16) {
        if let Ok(mut failures) = self.store.failures.lock() {
            failures.push_back(status);
        }
    }

    /// Number of mutating requests received, including failed ones.
    pub fn mutation_count(&self) -> usize {
        self.store.mutations.load(Ordering::SeqCst)
    }

    fn actor(&self) -> Result<Actor> {
        let ctx = self
            .identity
            .clone()
            .map(AuthContext::from)
            .unwrap_or_default();
        ctx.actor().map_err(rejection)
    }

    fn begin_mutation(&self) -> Result<Actor> {
        self.store.mutations.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .store
            .failures
            .lock()
            .ok()
            .and_then(|mut failures| failures.pop_front());
        if let Some(status) = injected {
            return Err(ClientError::from_status(status, None));
        }
        let actor = self.actor()?;
        if actor.id().is_none() {
            return Err(ClientError::Unauthorized);
        }
        Ok(actor)
    }

    fn current(&self, id: &ResourceId) -> Result<Resource> {
        self.get(id)
            .ok_or_else(|| ClientError::NotFound(format!("Resource {id} not found")))
    }

    fn transition(
        &self,
        id: &ResourceId,
        action: Action,
        comment: Option<&str>,
    ) -> Result<Resource> {
        let actor = self.begin_mutation()?;
        let current = self.current(id)?;
        let next =
            apply_transition(&current, &actor, action, comment, Utc::now()).map_err(rejection)?;
        self.insert(next.clone());
        info!(resource_id = %id, action = %action, status = %next.status, "Transition stored");
        Ok(next)
    }
}

/// Translate an engine rejection into the error the REST API would return.
fn rejection(err: WorkflowError) -> ClientError {
    let status = match &err {
        WorkflowError::InvalidTransition { .. } | WorkflowError::StorageUnavailable(_) => 409,
        WorkflowError::PermissionDenied { .. } | WorkflowError::SelfActionForbidden { .. } => 403,
        WorkflowError::CommentRequired { .. }
        | WorkflowError::InvalidRating(_)
        | WorkflowError::InvalidRole(_) => 400,
    };
    ClientError::from_status(
        status,
        Some(ErrorBody {
            code: err.code().to_string(),
            message: err.to_string(),
        }),
    )
}

#[async_trait]
impl ResourceBackend for MemoryBackend {
    async fn whoami(&self) -> Result<Option<Identity>> {
        Ok(self.identity.clone())
    }

    async fn fetch(&self, id: &ResourceId) -> Result<Resource> {
        let actor = self.actor()?;
        self.get(id)
            .filter(|r| can_view(r, &actor))
            .ok_or_else(|| ClientError::NotFound(format!("Resource {id} not found")))
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<Resource>> {
        let actor = self.actor()?;
        let visible: Vec<Resource> = self
            .store
            .resources
            .iter()
            .filter(|entry| can_view(entry.value(), &actor))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(query.paginate(visible))
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn submit(&self, id: &ResourceId) -> Result<Resource> {
        self.transition(id, Action::Submit, None)
    }

    #[instrument(skip(self, request), fields(resource_id = %id))]
    async fn review(&self, id: &ResourceId, request: &ReviewRequest) -> Result<Resource> {
        let action = match request.status {
            ResourceStatus::Approved => Action::Approve,
            ResourceStatus::Rejected => Action::Reject,
            other => {
                self.store.mutations.fetch_add(1, Ordering::SeqCst);
                return Err(ClientError::Api {
                    status: 400,
                    code: "VALIDATION_ERROR".into(),
                    message: format!("Review status must be approved or rejected, got {other}"),
                });
            }
        };
        self.transition(id, action, Some(&request.review_comment))
    }

    #[instrument(skip(self, request), fields(resource_id = %id))]
    async fn deactivate(&self, id: &ResourceId, request: &StatusChangeRequest) -> Result<Resource> {
        self.transition(id, Action::Deactivate, Some(&request.review_comment))
    }

    #[instrument(skip(self, request), fields(resource_id = %id))]
    async fn reactivate(&self, id: &ResourceId, request: &StatusChangeRequest) -> Result<Resource> {
        self.transition(id, Action::Reactivate, Some(&request.review_comment))
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn resubmit(&self, id: &ResourceId) -> Result<Resource> {
        self.transition(id, Action::Resubmit, None)
    }

    #[instrument(skip(self, request), fields(resource_id = %id))]
    async fn rate(&self, id: &ResourceId, request: &RatingRequest) -> Result<Resource> {
        let actor = self.begin_mutation()?;
        let current = self.current(id)?;
        let rating = apply_rating(&current, &actor, request.rating.value()).map_err(rejection)?;
        let Some(rater) = actor.id().cloned() else {
            return Err(ClientError::Unauthorized);
        };

        self.store
            .ratings
            .insert((id.clone(), rater), rating.value());
        let (count, sum) = self
            .store
            .ratings
            .iter()
            .filter(|entry| &entry.key().0 == id)
            .fold((0u32, 0u64), |(count, sum), entry| {
                (count + 1, sum + *entry.value() as u64)
            });

        let next = current.with_rating(RatingAggregate {
            rating_count: count,
            average_rating: sum as f64 / count as f64,
        });
        self.insert(next.clone());
        Ok(next)
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn delete(&self, id: &ResourceId) -> Result<()> {
        let actor = self.begin_mutation()?;
        let current = self.current(id)?;
        authorize_delete(&current, &actor).map_err(rejection)?;
        self.store.resources.remove(id);
        self.store.ratings.retain(|(resource_id, _), _| resource_id != id);
        info!(resource_id = %id, "Resource deleted");
        Ok(())
    }
}
