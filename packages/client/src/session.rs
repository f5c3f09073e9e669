use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, instrument, warn};
use workflow::{
    Action, ActionSet, Actor, AuthContext, Resource, ResourceId, apply_rating, apply_transition,
    authorize_delete, permitted_actions,
};

use crate::backend::{ListQuery, Page, RatingRequest, ResourceBackend};
use crate::error::{ClientError, Result};

/// A signed-in view over a [`ResourceBackend`].
///
/// Mutations are validated by the engine first and never reach the backend
/// when rejected. An accepted mutation is applied to the local cache
/// optimistically, then replaced by the server's answer, or rolled back if
/// the request fails.
pub struct ResourceSession<B> {
    backend: B,
    auth: AuthContext,
    actor: Actor,
    cache: Arc<DashMap<ResourceId, Resource>>,
}

impl<B: ResourceBackend> ResourceSession<B> {
    /// Ask the backend who we are.
    ///
    /// If that request fails the session continues as anonymous. A role the
    /// engine does not recognize is an error.
    pub async fn connect(backend: B, auth: AuthContext) -> Result<Self> {
        let resolved = match backend.whoami().await {
            Ok(Some(identity)) => AuthContext {
                token: auth.token.clone(),
                ..AuthContext::from(identity)
            },
            Ok(None) => AuthContext::anonymous(),
            Err(err) => {
                warn!(error = %err, "Could not fetch permissions, continuing as anonymous");
                AuthContext::anonymous()
            }
        };
        let actor = resolved.actor()?;
        info!(actor = ?actor.id(), role = %actor.role(), "Session established");
        Ok(Self::with_actor(backend, resolved, actor))
    }

    /// Build a session for an already-resolved actor.
    pub fn with_actor(backend: B, auth: AuthContext, actor: Actor) -> Self {
        Self {
            backend,
            auth,
            actor,
            cache: Arc::new(DashMap::new()),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn permissions(&self) -> ActionSet {
        self.actor.permissions()
    }

    /// The local snapshot, which may be optimistic while a request is in flight.
    pub fn cached(&self, id: &ResourceId) -> Option<Resource> {
        self.cache.get(id).map(|r| r.value().clone())
    }

    /// Fetch from the backend and refresh the cache.
    pub async fn load(&self, id: &ResourceId) -> Result<Resource> {
        match self.backend.fetch(id).await {
            Ok(resource) => {
                self.cache.insert(id.clone(), resource.clone());
                Ok(resource)
            }
            Err(ClientError::NotFound(msg)) => {
                self.cache.remove(id);
                Err(ClientError::NotFound(msg))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn load_page(&self, query: &ListQuery) -> Result<Page<Resource>> {
        let page = self.backend.list(query).await?;
        for resource in &page.items {
            self.cache.insert(resource.id.clone(), resource.clone());
        }
        Ok(page)
    }

    async fn snapshot(&self, id: &ResourceId) -> Result<Resource> {
        match self.cached(id) {
            Some(resource) => Ok(resource),
            None => self.load(id).await,
        }
    }

    /// Actions to offer for this resource.
    pub async fn available_actions(&self, id: &ResourceId) -> Result<Vec<Action>> {
        let resource = self.snapshot(id).await?;
        Ok(permitted_actions(&resource, &self.actor))
    }

    /// Undo an optimistic update after a failed request.
    async fn roll_back(&self, prior: Resource, err: &ClientError) {
        let id = prior.id.clone();
        self.cache.insert(id.clone(), prior);
        if matches!(err, ClientError::Conflict(_)) {
            // The server moved on without us; its state wins.
            if let Err(refetch_err) = self.load(&id).await {
                warn!(resource_id = %id, error = %refetch_err, "Re-fetch after conflict failed");
            }
        }
    }

    /// Apply a status transition.
    #[instrument(skip(self, comment), fields(resource_id = %id, action = %action))]
    pub async fn transition(
        &self,
        id: &ResourceId,
        action: Action,
        comment: Option<&str>,
    ) -> Result<Resource> {
        let prior = self.snapshot(id).await?;
        let next = apply_transition(&prior, &self.actor, action, comment, Utc::now())?;

        self.cache.insert(id.clone(), next.clone());

        match self.backend.persist_transition(action, &next).await {
            Ok(canonical) => {
                info!(status = %canonical.status, "Transition persisted");
                self.cache.insert(id.clone(), canonical.clone());
                Ok(canonical)
            }
            Err(err) => {
                warn!(error = %err, "Transition failed, rolling back");
                self.roll_back(prior, &err).await;
                Err(err)
            }
        }
    }

    /// Rate a resource. The aggregate in the result comes from the server.
    #[instrument(skip(self), fields(resource_id = %id))]
    pub async fn rate(&self, id: &ResourceId, value: u8) -> Result<Resource> {
        let current = self.snapshot(id).await?;
        let rating = apply_rating(&current, &self.actor, value)?;

        match self.backend.rate(id, &RatingRequest { rating }).await {
            Ok(canonical) => {
                self.cache.insert(id.clone(), canonical.clone());
                Ok(canonical)
            }
            Err(err) => {
                self.roll_back(current, &err).await;
                Err(err)
            }
        }
    }

    /// Delete a resource. Removed from the cache immediately, restored on failure.
    #[instrument(skip(self), fields(resource_id = %id))]
    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        let prior = self.snapshot(id).await?;
        authorize_delete(&prior, &self.actor)?;

        self.cache.remove(id);
        match self.backend.delete(id).await {
            Ok(()) => {
                info!("Resource deleted");
                Ok(())
            }
            Err(ClientError::NotFound(msg)) => {
                // Already gone on the server.
                Err(ClientError::NotFound(msg))
            }
            Err(err) => {
                warn!(error = %err, "Delete failed, restoring");
                self.roll_back(prior, &err).await;
                Err(err)
            }
        }
    }
}
