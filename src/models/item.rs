// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uniform shape over synced workout entities.
//!
//! Exercises and routines share one lifecycle (owner-scoped realtime list,
//! add/update/delete/toggle), so the bridge and projector are generic over
//! this trait instead of being written twice.

use crate::db::RawDocument;
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A workout entity persisted as one document in an owner-scoped collection.
pub trait WorkoutItem:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Store collection this entity lives in.
    const COLLECTION: &'static str;
    /// Human-readable label used in outcome messages ("Exercise", "Routine").
    const LABEL: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    fn user_id(&self) -> &str;
    fn set_user_id(&mut self, user_id: String);

    fn created_at(&self) -> i64;
    fn set_created_at(&mut self, millis: i64);

    fn is_completed(&self) -> bool;
    fn set_completed(&mut self, completed: bool);

    /// Serialize into a store document payload.
    ///
    /// The id lives in the document path, not the payload, so it is removed.
    /// The completion flag is mirrored into both `isCompleted` and
    /// `completed` so documents stay readable by old-style clients.
    fn to_document(&self) -> Result<Value> {
        let mut value =
            serde_json::to_value(self).map_err(|e| AppError::Decode(e.to_string()))?;
        if let Some(map) = value.as_object_mut() {
            map.remove("id");
            map.insert("completed".to_string(), Value::Bool(self.is_completed()));
        }
        Ok(value)
    }
}

/// Decode a store document into a typed workout item.
///
/// This is the single place that tolerates schema drift between the two
/// persisted completion fields: `isCompleted` wins, `completed` is the
/// fallback, and when both are absent the decoded default (`false`) stands.
pub fn decode_item<T: WorkoutItem>(doc: &RawDocument) -> Result<T> {
    let mut item: T = serde_json::from_value(doc.data.clone())
        .map_err(|e| AppError::Decode(format!("{}: {}", doc.id, e)))?;
    item.set_id(doc.id.clone());

    let completed = doc
        .data
        .get("isCompleted")
        .and_then(Value::as_bool)
        .or_else(|| doc.data.get("completed").and_then(Value::as_bool));
    if let Some(value) = completed {
        item.set_completed(value);
    }

    Ok(item)
}
