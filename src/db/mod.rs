// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store boundary.
//!
//! The sync core consumes a [`DocumentStore`] handle instead of a vendor SDK
//! so production (Firestore) and tests (in-memory) share one contract.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::{AppError, Result};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Collection names used by the mobile clients.
pub mod collections {
    pub const EXERCISES: &str = "exercises";
    pub const ROUTINES: &str = "routines";
}

/// One schema-flexible document as stored: path id plus field map.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub data: Value,
}

/// One complete batch of matching documents for a subscription.
pub type Snapshot = Vec<RawDocument>;

/// Handle to a live snapshot subscription.
///
/// Dropping the handle releases the underlying store listener: the producer
/// side observes the channel closing and shuts down.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Result<Snapshot>>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Result<Snapshot>>) -> Self {
        Self { rx }
    }

    /// Next snapshot, an error terminal, or `None` once the store side closed.
    pub async fn recv(&mut self) -> Option<Result<Snapshot>> {
        self.rx.recv().await
    }
}

/// Networked, schema-flexible per-record database with realtime push
/// subscriptions.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open an equality-filtered realtime subscription scoped to
    /// `userId == owner_id`. Every change yields one full [`Snapshot`].
    async fn subscribe(&self, collection: &str, owner_id: &str) -> Result<Subscription>;

    /// Point lookup by document id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>>;

    /// Create a document; the store assigns and returns the id.
    async fn create(&self, collection: &str, data: Value) -> Result<String>;

    /// Full-document overwrite by id (upsert).
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Partial field-level update by id; all fields land atomically.
    /// Fails when the document does not exist.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()>;

    /// Delete by id. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

/// Extract the owner id a document is tagged with.
pub(crate) fn document_owner(data: &Value) -> Option<&str> {
    data.get("userId").and_then(Value::as_str)
}

/// Map a store-level failure into the shared error type.
pub(crate) fn store_err(e: impl std::fmt::Display) -> AppError {
    AppError::Store(e.to_string())
}
