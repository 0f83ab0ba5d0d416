use crate::dtos::{MessageResponse, WriteResponse};
use crate::middleware::JsonObject;
use crate::models::Post;
use crate::services::{record_store_operation, StoreError};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

pub const POST_NOT_FOUND: &str = "Post not found";

/// Id-addressed failures all read as "not found" to the caller, whatever the
/// store actually said; the real cause only goes to the log.
fn post_not_found(id: &str, operation: &'static str, err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => {
            tracing::debug!(post_id = %id, operation, "Post not found");
        }
        other => {
            tracing::warn!(
                post_id = %id,
                operation,
                kind = other.kind(),
                error = %other,
                "Store operation failed"
            );
        }
    }
    AppError::NotFound(anyhow::anyhow!(POST_NOT_FOUND))
}

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let result = state.store.list().await;
    record_store_operation("list", &result);

    // Logged when the response is rendered; the client only sees the category.
    let posts = result
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e).context("Failed to list posts")))?;

    tracing::debug!(count = posts.len(), "Listed posts");
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.store.get(&id).await;
    record_store_operation("get", &result);

    let post = result.map_err(|e| post_not_found(&id, "get", e))?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let post = Post::for_create(body, Utc::now());

    let result = state.store.insert(post).await;
    record_store_operation("insert", &result);

    let written = result.map_err(|e| {
        tracing::error!(kind = e.kind(), error = %e, "Failed to create post");
        AppError::BadRequest(anyhow::anyhow!("Failed to create post"))
    })?;

    tracing::info!(post_id = %written.id, rev = %written.rev, "Post created");
    Ok((StatusCode::CREATED, Json(WriteResponse::ok(written.id))))
}

/// Full update. Same merge as [`patch_post`]: the body is overlaid on the
/// stored document, so omitted fields survive.
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    merge_and_write(&state, &id, body, "update").await
}

pub async fn patch_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    merge_and_write(&state, &id, body, "patch").await
}

async fn merge_and_write(
    state: &AppState,
    id: &str,
    body: serde_json::Map<String, serde_json::Value>,
    operation: &'static str,
) -> Result<Json<WriteResponse>, AppError> {
    let fetched = state.store.get(id).await;
    record_store_operation("get", &fetched);
    let existing = fetched.map_err(|e| post_not_found(id, operation, e))?;

    // Without both the write would land as a brand-new document.
    if existing.id().is_none() || existing.rev().is_none() {
        return Err(post_not_found(
            id,
            operation,
            StoreError::Decode("stored document lacks _id or _rev".to_string()),
        ));
    }

    let merged = Post::merge_update(&existing, body, Utc::now());

    let result = state.store.insert(merged).await;
    record_store_operation("insert", &result);
    let written = result.map_err(|e| post_not_found(id, operation, e))?;

    tracing::info!(post_id = %written.id, rev = %written.rev, operation, "Post updated");
    Ok(Json(WriteResponse::ok(written.id)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let fetched = state.store.get(&id).await;
    record_store_operation("get", &fetched);
    let existing = fetched.map_err(|e| post_not_found(&id, "delete", e))?;

    // Stored documents always carry both; anything else is a corrupt record.
    let (Some(doc_id), Some(rev)) = (existing.id(), existing.rev()) else {
        return Err(post_not_found(
            &id,
            "delete",
            StoreError::Decode("stored document lacks _id or _rev".to_string()),
        ));
    };

    let result = state.store.destroy(doc_id, rev).await;
    record_store_operation("destroy", &result);
    result.map_err(|e| post_not_found(&id, "delete", e))?;

    tracing::info!(post_id = %doc_id, "Post deleted");
    Ok(Json(WriteResponse::ok(doc_id)))
}

/// `/all` answers every method with 405.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MessageResponse {
            message: "Method not allowed".to_string(),
        }),
    )
}

pub async fn route_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not found"))
}
