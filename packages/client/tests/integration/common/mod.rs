use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use client::{BackendConfig, Identity, MemoryBackend};
use workflow::{Resource, ResourceStatus, StorageStatus};

pub const OWNER: &str = "u1";
pub const OTHER_USER: &str = "u2";
pub const ADMIN: &str = "a1";
pub const SECOND_ADMIN: &str = "a2";

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap()
}

pub fn identity(id: &str, role: &str) -> Option<Identity> {
    Some(Identity {
        id: id.to_string(),
        role: Some(role.to_string()),
    })
}

/// A synced resource owned by [`OWNER`].
pub fn resource(id: &str, status: ResourceStatus) -> Resource {
    Resource::new(id, OWNER, format!("Resource {id}"), created_at())
        .with_status(status)
        .with_storage_status(StorageStatus::Synced)
}

/// A store seeded with `resources`, plus a handle acting as `id`/`role`.
pub fn seeded(resources: Vec<Resource>, id: &str, role: &str) -> (MemoryBackend, MemoryBackend) {
    let store = MemoryBackend::new();
    for r in resources {
        store.insert(r);
    }
    let handle = store.connect_as(identity(id, role));
    (store, handle)
}

/// Backend config pointed at a mock server, without retry delays.
pub fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        max_retries: 2,
        retry_base_ms: 1,
        retry_max_ms: 5,
    }
}

/// Wire JSON of a resource as the REST API returns it.
pub fn resource_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "owner": OWNER,
        "status": status,
        "storage_status": "synced",
        "title": format!("Resource {id}"),
        "description": null,
        "file_name": "notes.pdf",
        "file_size": 1024,
        "review_comment": null,
        "reviewed_by": null,
        "reviewed_at": null,
        "rating_count": 0,
        "average_rating": 0.0,
        "created_at": "2024-04-02T10:00:00Z",
        "updated_at": "2024-04-02T10:00:00Z"
    })
}

pub fn reviewed_json(id: &str, status: &str, by: &str, comment: &str) -> Value {
    let mut value = resource_json(id, status);
    value["reviewed_by"] = json!(by);
    value["review_comment"] = json!(comment);
    value["reviewed_at"] = json!("2024-04-03T08:30:00Z");
    value["updated_at"] = json!("2024-04-03T08:30:00Z");
    value
}
