//! In-memory document store.
//!
//! Keeps posts in a `BTreeMap` behind an async read-write lock and hands out
//! CouchDB-style revisions (`{generation}-{random}`), enforcing the same
//! revision checks so handlers behave identically against either store.

use crate::models::Post;
use crate::services::store::{document_id, PostStore, StoreError, WriteResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Post>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn next_rev(current: Option<&str>) -> String {
    let generation = current
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(generation, _)| generation.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{}", generation + 1, Uuid::new_v4().simple())
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Post, StoreError> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, mut post: Post) -> Result<WriteResult, StoreError> {
        let id = match document_id(&post)? {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };

        let mut documents = self.documents.write().await;

        let rev = match documents.get(&id) {
            Some(current) => {
                if post.rev() != current.rev() {
                    return Err(StoreError::Conflict);
                }
                next_rev(current.rev())
            }
            None => {
                if post.rev().is_some() {
                    return Err(StoreError::Conflict);
                }
                next_rev(None)
            }
        };

        post.set_id(&id);
        post.set_rev(&rev);
        documents.insert(id.clone(), post);

        Ok(WriteResult { id, rev })
    }

    async fn destroy(&self, id: &str, rev: &str) -> Result<WriteResult, StoreError> {
        let mut documents = self.documents.write().await;

        let current = documents.get(id).ok_or(StoreError::NotFound)?;
        if current.rev() != Some(rev) {
            return Err(StoreError::Conflict);
        }

        let tombstone_rev = next_rev(current.rev());
        documents.remove(id);

        Ok(WriteResult {
            id: id.to_string(),
            rev: tombstone_rev,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
