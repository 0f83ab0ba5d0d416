#![allow(dead_code)]

use async_trait::async_trait;
use blog_service::config::{
    BlogConfig, CouchConfig, ObservabilityConfig, StoreBackend, StoreConfig,
};
use blog_service::models::Post;
use blog_service::services::{InMemoryStore, PostStore, StoreError, WriteResult};
use blog_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: InMemoryStore,
    pub client: reqwest::Client,
}

/// Configuration for tests: random port, in-memory store, nothing read from
/// the environment.
pub fn test_config() -> BlogConfig {
    BlogConfig {
        common: CoreConfig { port: 0 },
        store: StoreConfig {
            backend: StoreBackend::Memory,
        },
        couchdb: CouchConfig {
            url: "http://127.0.0.1:5984".to_string(),
            database: "posts_test".to_string(),
            username: None,
            password: None,
            ca_cert_path: None,
            create_database: false,
        },
        observability: ObservabilityConfig {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = InMemoryStore::new();
        let app = Application::build_with_store(&test_config(), Arc::new(store.clone()))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections by polling the liveness route
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            store,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create(&self, body: serde_json::Value) -> String {
        let response = self
            .client
            .post(self.url("/post"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_str().expect("id missing").to_string()
    }

    pub async fn fetch(&self, id: &str) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/getby/{}", id)))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Store whose every call fails with the configured error.
pub struct FailingStore {
    pub error: fn() -> StoreError,
}

impl FailingStore {
    pub fn unavailable() -> Self {
        Self {
            error: || StoreError::Rejected {
                status: 503,
                reason: "internal detail: node couch-2 is down".to_string(),
            },
        }
    }
}

#[async_trait]
impl PostStore for FailingStore {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        Err((self.error)())
    }

    async fn get(&self, _id: &str) -> Result<Post, StoreError> {
        Err((self.error)())
    }

    async fn insert(&self, _post: Post) -> Result<WriteResult, StoreError> {
        Err((self.error)())
    }

    async fn destroy(&self, _id: &str, _rev: &str) -> Result<WriteResult, StoreError> {
        Err((self.error)())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err((self.error)())
    }
}

/// Serves reads from an inner store but fails every write with a conflict,
/// as when another writer got there first.
pub struct ConflictingWrites {
    pub inner: InMemoryStore,
}

#[async_trait]
impl PostStore for ConflictingWrites {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        self.inner.list().await
    }

    async fn get(&self, id: &str) -> Result<Post, StoreError> {
        self.inner.get(id).await
    }

    async fn insert(&self, _post: Post) -> Result<WriteResult, StoreError> {
        Err(StoreError::Conflict)
    }

    async fn destroy(&self, _id: &str, _rev: &str) -> Result<WriteResult, StoreError> {
        Err(StoreError::Conflict)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Answers every read with a body that is not a stored document, as CouchDB
/// does for reserved paths such as `_all_docs`. Writes go to `inner`.
pub struct NonDocumentReads {
    pub inner: InMemoryStore,
}

#[async_trait]
impl PostStore for NonDocumentReads {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        self.inner.list().await
    }

    async fn get(&self, _id: &str) -> Result<Post, StoreError> {
        Ok(serde_json::from_value(serde_json::json!({
            "total_rows": 0,
            "offset": 0,
            "rows": []
        }))
        .expect("object deserializes as Post"))
    }

    async fn insert(&self, post: Post) -> Result<WriteResult, StoreError> {
        self.inner.insert(post).await
    }

    async fn destroy(&self, id: &str, rev: &str) -> Result<WriteResult, StoreError> {
        self.inner.destroy(id, rev).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
