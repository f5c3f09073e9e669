use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use client::{ClientError, HttpBackend, ListQuery, ResourceBackend, ResourceSession};
use workflow::{Action, AuthContext, ResourceId, ResourceStatus, Role};

use crate::common::{ADMIN, OWNER, backend_config, resource_json, reviewed_json};

const TOKEN: &str = "test-token";

fn admin_auth() -> AuthContext {
    AuthContext::new(ADMIN, "admin").with_token(TOKEN)
}

fn backend(server: &MockServer, auth: &AuthContext) -> HttpBackend {
    HttpBackend::new(&backend_config(&server.uri()), auth).unwrap()
}

async fn mount_whoami(server: &MockServer, id: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id, "role": role })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_sends_bearer_and_parses_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/r1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reviewed_json("r1", "approved", ADMIN, "looks good")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resource = backend(&server, &admin_auth())
        .fetch(&ResourceId::from("r1"))
        .await
        .unwrap();

    assert_eq!(resource.status, ResourceStatus::Approved);
    assert_eq!(resource.owner.as_str(), OWNER);
    assert_eq!(resource.review_comment(), Some("looks good"));
    assert_eq!(resource.reviewed_by().map(|id| id.as_str()), Some(ADMIN));
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "NOT_FOUND",
            "message": "Resource missing not found"
        })))
        .mount(&server)
        .await;

    let result = backend(&server, &admin_auth())
        .fetch(&ResourceId::from("missing"))
        .await;

    assert!(matches!(
        result,
        Err(ClientError::NotFound(msg)) if msg == "Resource missing not found"
    ));
}

#[tokio::test]
async fn list_sends_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources"))
        .and(query_param("status", "pending"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .and(query_param("sort", "average_rating"))
        .and(query_param("order", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [resource_json("r7", "pending")],
            "page": 2,
            "per_page": 100,
            "total": 101
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery {
        status: Some(ResourceStatus::Pending),
        page: 2,
        per_page: 500,
        sort: client::SortField::AverageRating,
        order: client::SortOrder::Asc,
        ..ListQuery::default()
    };
    let page = backend(&server, &admin_auth()).list(&query).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 101);
    assert_eq!(page.total_pages(), 2);
}

#[tokio::test]
async fn reads_are_retried_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/r1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resources/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r1", "pending")))
        .expect(1)
        .mount(&server)
        .await;

    let resource = backend(&server, &admin_auth())
        .fetch(&ResourceId::from("r1"))
        .await
        .unwrap();

    assert_eq!(resource.status, ResourceStatus::Pending);
}

#[tokio::test]
async fn mutations_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/resources/r1/submit"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend(&server, &admin_auth())
        .submit(&ResourceId::from("r1"))
        .await;

    assert!(matches!(result, Err(ClientError::Api { status: 503, .. })));
}

#[tokio::test]
async fn reserved_characters_stay_in_the_id_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/r%231"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r#1", "pending")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/resources/a%2Fb%3Fc/resubmit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("a/b?c", "pending")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resources/r"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r", "approved")))
        .expect(0)
        .mount(&server)
        .await;

    let http = backend(&server, &admin_auth());
    let fetched = http.fetch(&ResourceId::from("r#1")).await.unwrap();
    assert_eq!(fetched.id.as_str(), "r#1");

    let resubmitted = http.resubmit(&ResourceId::from("a/b?c")).await.unwrap();
    assert_eq!(resubmitted.id.as_str(), "a/b?c");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/resources/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r1", "approved")))
        .expect(1)
        .mount(&server)
        .await;

    let config = backend_config(&format!("{}/api/v1/", server.uri()));
    let resource = HttpBackend::new(&config, &admin_auth())
        .unwrap()
        .fetch(&ResourceId::from("r1"))
        .await
        .unwrap();
    assert_eq!(resource.status, ResourceStatus::Approved);
}

#[test]
fn unusable_base_url_is_rejected() {
    let result = HttpBackend::new(&backend_config("not a url"), &AuthContext::anonymous());
    assert!(matches!(result, Err(ClientError::InvalidBaseUrl(_))));
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/resources/r1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server, &admin_auth())
        .delete(&ResourceId::from("r1"))
        .await
        .unwrap();
}

mod session {
    use super::*;

    #[tokio::test]
    async fn approve_posts_review_body() {
        let server = MockServer::start().await;
        mount_whoami(&server, ADMIN, "admin").await;
        Mock::given(method("GET"))
            .and(path("/resources/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r1", "pending")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/r1/review"))
            .and(body_json(json!({
                "status": "approved",
                "review_comment": "ok",
                "reviewed_by": ADMIN
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reviewed_json("r1", "approved", ADMIN, "ok")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = admin_auth();
        let session = ResourceSession::connect(backend(&server, &auth), auth)
            .await
            .unwrap();
        let approved = session
            .transition(&ResourceId::from("r1"), Action::Approve, Some(" ok "))
            .await
            .unwrap();

        assert_eq!(approved.status, ResourceStatus::Approved);
        assert_eq!(session.auth().token.as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn conflict_rolls_back_and_refetches() {
        let server = MockServer::start().await;
        mount_whoami(&server, ADMIN, "admin").await;
        Mock::given(method("GET"))
            .and(path("/resources/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r1", "pending")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resources/r1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reviewed_json("r1", "approved", "a2", "fine")),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/r1/review"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "INVALID_TRANSITION",
                "message": "Cannot reject from approved"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = admin_auth();
        let session = ResourceSession::connect(backend(&server, &auth), auth)
            .await
            .unwrap();
        let id = ResourceId::from("r1");
        session.load(&id).await.unwrap();

        let result = session.transition(&id, Action::Reject, Some("spam")).await;

        assert!(matches!(
            result,
            Err(ClientError::Conflict(msg)) if msg == "Cannot reject from approved"
        ));
        let cached = session.cached(&id).unwrap();
        assert_eq!(cached.status, ResourceStatus::Approved);
        assert_eq!(cached.review_comment(), Some("fine"));
    }

    #[tokio::test]
    async fn expired_token_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let auth = admin_auth();
        let session = ResourceSession::connect(backend(&server, &auth), auth)
            .await
            .unwrap();

        assert_eq!(session.actor().role(), Role::Anonymous);
    }

    #[tokio::test]
    async fn unreachable_permissions_fail_closed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let auth = admin_auth();
        let session = ResourceSession::connect(backend(&server, &auth), auth)
            .await
            .unwrap();

        assert_eq!(session.actor().role(), Role::Anonymous);
        assert!(!session.permissions().can_review);
        assert!(!session.permissions().can_upload);
    }

    #[tokio::test]
    async fn optimistic_state_is_visible_while_in_flight() {
        let server = MockServer::start().await;
        mount_whoami(&server, ADMIN, "admin").await;
        Mock::given(method("GET"))
            .and(path("/resources/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resource_json("r1", "pending")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/r1/review"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reviewed_json("r1", "approved", ADMIN, "ok"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let auth = admin_auth();
        let session = Arc::new(
            ResourceSession::connect(backend(&server, &auth), auth)
                .await
                .unwrap(),
        );
        let id = ResourceId::from("r1");
        session.load(&id).await.unwrap();

        let in_flight = {
            let session = Arc::clone(&session);
            let id = id.clone();
            tokio::spawn(async move { session.transition(&id, Action::Approve, Some("ok")).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let optimistic = session.cached(&id).unwrap();
        assert_eq!(optimistic.status, ResourceStatus::Approved);
        assert_eq!(optimistic.reviewed_by().map(|id| id.as_str()), Some(ADMIN));

        let canonical = in_flight.await.unwrap().unwrap();
        assert_eq!(session.cached(&id), Some(canonical));
    }
}
