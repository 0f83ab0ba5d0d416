//! Document store abstraction.
//!
//! Handlers only ever talk to a [`PostStore`]. The production implementation
//! is [`CouchDb`](super::CouchDb); [`InMemoryStore`](super::InMemoryStore)
//! mimics its revision semantics for tests and local runs.

use crate::models::Post;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity and new revision of a document after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub id: String,
    pub rev: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    /// The supplied revision is not the document's current one.
    #[error("document update conflict")]
    Conflict,

    #[error("store rejected request with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error("invalid store url: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound => "not_found",
            StoreError::Conflict => "conflict",
            StoreError::Rejected { .. } => "rejected",
            StoreError::Transport(_) => "transport",
            StoreError::Decode(_) => "decode",
            StoreError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// The caller-chosen id of a document about to be written, if any.
///
/// An `_id` that is present must be a non-empty string.
pub fn document_id(post: &Post) -> Result<Option<&str>, StoreError> {
    match post.get("_id") {
        None => Ok(None),
        Some(serde_json::Value::String(id)) if !id.is_empty() => Ok(Some(id.as_str())),
        Some(serde_json::Value::String(_)) => Err(StoreError::Rejected {
            status: 400,
            reason: "Document id must not be empty".to_string(),
        }),
        Some(_) => Err(StoreError::Rejected {
            status: 400,
            reason: "Document id must be a string".to_string(),
        }),
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Every live document, bodies included.
    async fn list(&self) -> Result<Vec<Post>, StoreError>;

    async fn get(&self, id: &str) -> Result<Post, StoreError>;

    /// Create or overwrite a document. A document carrying `_id` and `_rev`
    /// updates that revision; one without `_id` gets a store-assigned id.
    async fn insert(&self, post: Post) -> Result<WriteResult, StoreError>;

    async fn destroy(&self, id: &str, rev: &str) -> Result<WriteResult, StoreError>;

    /// Cheap reachability check for health probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
