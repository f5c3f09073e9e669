//! I/O layer around the workflow engine: configuration, auth, backends and
//! the optimistic-update session.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod retry;
pub mod session;

pub use backend::{
    Identity, ListQuery, Page, RatingRequest, ResourceBackend, ReviewRequest, SortField,
    SortOrder, StatusChangeRequest,
};
pub use config::{AuthConfig, BackendConfig, ClientAppConfig};
pub use error::{ClientError, Result};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use session::ResourceSession;
