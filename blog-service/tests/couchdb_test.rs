use blog_service::config::CouchConfig;
use blog_service::models::Post;
use blog_service::services::{CouchDb, PostStore, StoreError, WriteResult};
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn couch_config(server: &MockServer) -> CouchConfig {
    CouchConfig {
        url: server.uri(),
        database: "posts".to_string(),
        username: None,
        password: None,
        ca_cert_path: None,
        create_database: false,
    }
}

async fn couch(server: &MockServer) -> CouchDb {
    CouchDb::connect(&couch_config(server))
        .await
        .expect("Failed to build CouchDB client")
}

fn post(value: serde_json::Value) -> Post {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn list_reads_all_docs_including_design_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/_all_docs"))
        .and(query_param("include_docs", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": 3,
            "offset": 0,
            "rows": [
                { "id": "_design/views", "key": "_design/views", "value": { "rev": "1-d" },
                  "doc": { "_id": "_design/views", "_rev": "1-d", "views": {} } },
                { "id": "a", "key": "a", "value": { "rev": "1-a" },
                  "doc": { "_id": "a", "_rev": "1-a", "title": "A" } },
                { "id": "b", "key": "b", "value": { "rev": "2-b" },
                  "doc": { "_id": "b", "_rev": "2-b", "title": "B" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = couch(&server).await.list().await.unwrap();

    let ids: Vec<_> = posts.iter().filter_map(|p| p.id()).collect();
    assert_eq!(ids, vec!["_design/views", "a", "b"]);
    assert_eq!(posts[2].get("title"), Some(&json!("B")));
}

#[tokio::test]
async fn get_returns_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "_id": "abc", "_rev": "3-x", "title": "Hi" })),
        )
        .mount(&server)
        .await;

    let doc = couch(&server).await.get("abc").await.unwrap();

    assert_eq!(doc.id(), Some("abc"));
    assert_eq!(doc.rev(), Some("3-x"));
    assert_eq!(doc.get("title"), Some(&json!("Hi")));
}

#[tokio::test]
async fn get_missing_document_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "not_found", "reason": "missing" })),
        )
        .mount(&server)
        .await;

    let result = couch(&server).await.get("nope").await;

    assert!(matches!(result, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn insert_without_id_posts_to_database() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_json(json!({ "title": "A", "published": false })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "ok": true, "id": "gen1", "rev": "1-r" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = couch(&server)
        .await
        .insert(post(json!({ "title": "A", "published": false })))
        .await
        .unwrap();

    assert_eq!(
        result,
        WriteResult {
            id: "gen1".to_string(),
            rev: "1-r".to_string()
        }
    );
}

#[tokio::test]
async fn insert_with_empty_id_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = couch(&server).await.insert(post(json!({ "_id": "" }))).await;

    assert!(matches!(result, Err(StoreError::Rejected { status: 400, .. })));
}

#[tokio::test]
async fn insert_with_id_puts_document_including_revision() {
    let server = MockServer::start().await;
    let body = json!({ "_id": "abc", "_rev": "1-r", "title": "B" });
    Mock::given(method("PUT"))
        .and(path("/posts/abc"))
        .and(body_json(body.clone()))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "ok": true, "id": "abc", "rev": "2-s" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = couch(&server).await.insert(post(body)).await.unwrap();

    assert_eq!(result.id, "abc");
    assert_eq!(result.rev, "2-s");
}

#[tokio::test]
async fn stale_revision_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/posts/abc"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "conflict",
            "reason": "Document update conflict."
        })))
        .mount(&server)
        .await;

    let result = couch(&server)
        .await
        .insert(post(json!({ "_id": "abc", "_rev": "1-old" })))
        .await;

    assert!(matches!(result, Err(StoreError::Conflict)));
}

#[tokio::test]
async fn destroy_sends_revision_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/posts/abc"))
        .and(query_param("rev", "2-s"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "id": "abc", "rev": "3-t" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = couch(&server).await.destroy("abc", "2-s").await.unwrap();

    assert_eq!(result.id, "abc");
}

#[tokio::test]
async fn other_failures_carry_status_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/abc"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized",
            "reason": "Name or password is incorrect."
        })))
        .mount(&server)
        .await;

    let result = couch(&server).await.get("abc").await;

    match result {
        Err(StoreError::Rejected { status, reason }) => {
            assert_eq!(status, 401);
            assert_eq!(reason, "Name or password is incorrect.");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_document_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2]"))
        .mount(&server)
        .await;

    let result = couch(&server).await.get("abc").await;

    assert!(matches!(result, Err(StoreError::Decode(_))));
}

#[tokio::test]
async fn credentials_are_sent_as_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "db_name": "posts" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = couch_config(&server);
    config.username = Some("admin".to_string());
    config.password = Some(Secret::new("secret".to_string()));
    let db = CouchDb::connect(&config).await.unwrap();

    db.ping().await.unwrap();
}

#[tokio::test]
async fn ping_fails_when_database_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(matches!(
        couch(&server).await.ping().await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn ensure_database_accepts_existing_database() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "error": "file_exists",
            "reason": "The database could not be created, the file already exists."
        })))
        .expect(1)
        .mount(&server)
        .await;

    couch(&server).await.ensure_database().await.unwrap();
}

#[tokio::test]
async fn ensure_database_surfaces_permission_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "forbidden",
            "reason": "You are not a server admin."
        })))
        .mount(&server)
        .await;

    let result = couch(&server).await.ensure_database().await;

    assert!(matches!(result, Err(StoreError::Rejected { status: 403, .. })));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = CouchConfig {
        url: "http://127.0.0.1:1".to_string(),
        database: "posts".to_string(),
        username: None,
        password: None,
        ca_cert_path: None,
        create_database: false,
    };
    let db = CouchDb::connect(&config).await.unwrap();

    assert!(matches!(db.ping().await, Err(StoreError::Transport(_))));
}
