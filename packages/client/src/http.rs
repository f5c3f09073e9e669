use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use workflow::{AuthContext, Resource, ResourceId};

use crate::backend::{
    Identity, ListQuery, Page, RatingRequest, ResourceBackend, ReviewRequest, StatusChangeRequest,
};
use crate::config::BackendConfig;
use crate::error::{ClientError, ErrorBody, Result};
use crate::retry::{RetryPolicy, with_retry};

/// [`ResourceBackend`] over the REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    bearer: Option<String>,
    retry: RetryPolicy,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig, auth: &AuthContext) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            bearer: auth.bearer(),
            retry: RetryPolicy::from(config),
        })
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `#` stay inside their segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn resource_url(&self, id: &ResourceId, action: Option<&str>) -> Url {
        match action {
            Some(action) => self.url(&["resources", id.as_str(), action]),
            None => self.url(&["resources", id.as_str()]),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(bearer) => request.header(reqwest::header::AUTHORIZATION, bearer),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.json::<ErrorBody>().await.ok();
        debug!(status = status.as_u16(), code = ?body.as_ref().map(|b| &b.code), "Request failed");
        Err(ClientError::from_status(status.as_u16(), body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ResourceBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn whoami(&self) -> Result<Option<Identity>> {
        if self.bearer.is_none() {
            return Ok(None);
        }
        with_retry(self.retry, "whoami", || async {
            let request = self.client.get(self.url(&["auth", "me"]));
            let response = self.authorize(request).send().await?;
            match response.status() {
                StatusCode::UNAUTHORIZED => Ok(None),
                status if status.is_success() => response
                    .json::<Identity>()
                    .await
                    .map(Some)
                    .map_err(|e| ClientError::InvalidResponse(e.to_string())),
                status => Err(ClientError::from_status(
                    status.as_u16(),
                    response.json::<ErrorBody>().await.ok(),
                )),
            }
        })
        .await
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn fetch(&self, id: &ResourceId) -> Result<Resource> {
        with_retry(self.retry, "fetch", || {
            self.send_json(self.client.get(self.resource_url(id, None)))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &ListQuery) -> Result<Page<Resource>> {
        let query = query.clone().normalized();
        with_retry(self.retry, "list", || {
            self.send_json(self.client.get(self.url(&["resources"])).query(&query))
        })
        .await
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn submit(&self, id: &ResourceId) -> Result<Resource> {
        self.send_json(self.client.post(self.resource_url(id, Some("submit")))).await
    }

    #[instrument(skip(self, request), fields(resource_id = %id, status = %request.status))]
    async fn review(&self, id: &ResourceId, request: &ReviewRequest) -> Result<Resource> {
        self.send_json(
            self.client
                .post(self.resource_url(id, Some("review")))
                .json(request),
        )
        .await
    }

    #[instrument(skip(self, request), fields(resource_id = %id))]
    async fn deactivate(&self, id: &ResourceId, request: &StatusChangeRequest) -> Result<Resource> {
        self.send_json(
            self.client
                .post(self.resource_url(id, Some("deactivate")))
                .json(request),
        )
        .await
    }

    #[instrument(skip(self, request), fields(resource_id = %id))]
    async fn reactivate(&self, id: &ResourceId, request: &StatusChangeRequest) -> Result<Resource> {
        self.send_json(
            self.client
                .post(self.resource_url(id, Some("reactivate")))
                .json(request),
        )
        .await
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn resubmit(&self, id: &ResourceId) -> Result<Resource> {
        self.send_json(self.client.post(self.resource_url(id, Some("resubmit")))).await
    }

    #[instrument(skip(self, request), fields(resource_id = %id, rating = request.rating.value()))]
    async fn rate(&self, id: &ResourceId, request: &RatingRequest) -> Result<Resource> {
        self.send_json(
            self.client
                .post(self.resource_url(id, Some("rating")))
                .json(request),
        )
        .await
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn delete(&self, id: &ResourceId) -> Result<()> {
        self.send(self.client.delete(self.resource_url(id, None))).await?;
        Ok(())
    }
}
