use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde_json::{Map, Value};
use service_core::error::AppError;

pub const INVALID_BODY: &str = "Invalid JSON body";

/// JSON object request body.
///
/// Any object is accepted as-is; there is no schema. Malformed JSON, a
/// missing `application/json` content type, or a non-object payload are all
/// rejected with 400 before the handler runs.
#[derive(Debug, Clone)]
pub struct JsonObject(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
                AppError::BadRequest(anyhow::anyhow!(INVALID_BODY))
            })?;

        match value {
            Value::Object(fields) => Ok(JsonObject(fields)),
            other => {
                tracing::debug!(kind = json_kind(&other), "Request body is not a JSON object");
                Err(AppError::BadRequest(anyhow::anyhow!(INVALID_BODY)))
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
