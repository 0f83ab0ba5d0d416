//! Blog post documents.
//!
//! Posts are schemaless JSON objects. The only fields this service knows about
//! are the store's bookkeeping (`_id`, `_rev`) and the timestamps and flags it
//! stamps itself.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "_id";
pub const REV_FIELD: &str = "_rev";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";
pub const PUBLISHED_FIELD: &str = "published";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(Map<String, Value>);

impl Post {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a new post from a request body: every caller field is kept, then
    /// `createdAt` and `published` are stamped over it.
    pub fn for_create(body: Map<String, Value>, now: DateTime<Utc>) -> Self {
        let mut post = Self(body);
        post.0
            .insert(CREATED_AT_FIELD.to_string(), Value::String(timestamp(now)));
        post.0.insert(PUBLISHED_FIELD.to_string(), Value::Bool(false));
        post
    }

    /// Shallow-merge `body` over `existing`.
    ///
    /// Top-level keys from `body` win, keys it omits are kept, and `_id`/`_rev`
    /// are always taken from `existing` so a write can neither move the
    /// document nor forge its revision. `updatedAt` is stamped last.
    pub fn merge_update(existing: &Post, body: Map<String, Value>, now: DateTime<Utc>) -> Self {
        let mut merged = existing.0.clone();
        merged.extend(body);

        for key in [ID_FIELD, REV_FIELD] {
            match existing.0.get(key) {
                Some(value) => {
                    merged.insert(key.to_string(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        merged.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp(now)));
        Self(merged)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn rev(&self) -> Option<&str> {
        self.0.get(REV_FIELD).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: &str) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }

    pub fn set_rev(&mut self, rev: &str) {
        self.0.insert(REV_FIELD.to_string(), Value::String(rev.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:30:00.000Z`.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
