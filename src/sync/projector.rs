// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! State projector: per-entity observable list plus mutation outcomes.
//!
//! Holds the latest bridge snapshot in a watch channel for the UI to
//! observe, and exposes one-shot mutations whose results land in a separate
//! outcome slot. Mutations never throw past this boundary; every store
//! failure is folded into [`Outcome::Failure`].

use crate::auth::AuthService;
use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{decode_item, WorkoutItem};
use crate::models::{Exercise, Routine};
use crate::sync::bridge::watch_items;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

/// Observable result of the most recent one-shot mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Neutral: nothing to report.
    Idle,
    /// A mutation is in flight.
    Pending,
    Success(String),
    Failure(String),
}

/// Per-entity view-model over the subscription bridge.
pub struct ItemProjector<T: WorkoutItem> {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
    items_rx: watch::Receiver<Vec<T>>,
    outcome: Arc<watch::Sender<Outcome>>,
    driver: tokio::task::JoinHandle<()>,
}

pub type ExerciseProjector = ItemProjector<Exercise>;
pub type RoutineProjector = ItemProjector<Routine>;

impl<T: WorkoutItem> ItemProjector<T> {
    /// Start projecting the given principal-scoped collection.
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn DocumentStore>) -> Self {
        let (items_tx, items_rx) = watch::channel(Vec::new());
        let (outcome_tx, _) = watch::channel(Outcome::Idle);
        let outcome = Arc::new(outcome_tx);

        let mut stream = watch_items::<T>(auth.clone(), store.clone());
        let driver_outcome = Arc::clone(&outcome);
        let driver = tokio::spawn(async move {
            while let Some(result) = stream.next_snapshot().await {
                match result {
                    Ok(items) => {
                        items_tx.send_replace(items);
                    }
                    Err(e) => {
                        // Terminal bridge error; surface it where the UI
                        // already looks.
                        tracing::error!(collection = T::COLLECTION, error = %e, "Live sync failed");
                        driver_outcome.send_replace(Outcome::Failure(e.to_string()));
                        break;
                    }
                }
            }
        });

        Self {
            auth,
            store,
            items_rx,
            outcome,
            driver,
        }
    }

    /// Observable handle on the projected list.
    pub fn items(&self) -> watch::Receiver<Vec<T>> {
        self.items_rx.clone()
    }

    /// The list as of the latest snapshot.
    pub fn current_items(&self) -> Vec<T> {
        self.items_rx.borrow().clone()
    }

    /// Observable handle on the outcome slot.
    pub fn outcome(&self) -> watch::Receiver<Outcome> {
        self.outcome.subscribe()
    }

    /// The outcome slot's current value.
    pub fn current_outcome(&self) -> Outcome {
        self.outcome.borrow().clone()
    }

    /// Reset the outcome slot so the UI stops showing a stale result.
    pub fn clear_outcome(&self) {
        self.outcome.send_replace(Outcome::Idle);
    }

    /// Create a new item owned by the current principal.
    ///
    /// Fails without touching the store when nobody is signed in. The list
    /// is not updated optimistically; the next snapshot carries the item.
    pub async fn add(&self, item: T) -> Outcome {
        self.outcome.send_replace(Outcome::Pending);
        let outcome = match self.try_add(item).await {
            Ok(()) => Outcome::Success(format!("{} added successfully", T::LABEL)),
            Err(e) => Outcome::Failure(e.to_string()),
        };
        self.outcome.send_replace(outcome.clone());
        outcome
    }

    async fn try_add(&self, mut item: T) -> Result<()> {
        let principal = self
            .auth
            .current_principal()
            .ok_or(AppError::NotAuthenticated)?;
        // Ownership is never trusted from the caller.
        item.set_user_id(principal.id);
        if item.created_at() == 0 {
            item.set_created_at(chrono::Utc::now().timestamp_millis());
        }
        let doc = item.to_document()?;
        let id = self.store.create(T::COLLECTION, doc).await?;
        tracing::debug!(collection = T::COLLECTION, id = %id, "Item created");
        Ok(())
    }

    /// Full-document overwrite of an existing item.
    ///
    /// The ownership tag is preserved when already set (cross-principal
    /// edits stay possible), and filled from the current principal when the
    /// caller left it empty.
    pub async fn update(&self, item: T) -> Outcome {
        self.outcome.send_replace(Outcome::Pending);
        let outcome = match self.try_update(item).await {
            Ok(()) => Outcome::Success(format!("{} updated successfully", T::LABEL)),
            Err(e) => Outcome::Failure(e.to_string()),
        };
        self.outcome.send_replace(outcome.clone());
        outcome
    }

    async fn try_update(&self, mut item: T) -> Result<()> {
        let principal = self
            .auth
            .current_principal()
            .ok_or(AppError::NotAuthenticated)?;
        if item.user_id().is_empty() {
            item.set_user_id(principal.id);
        }
        let id = item.id().to_string();
        let doc = item.to_document()?;
        self.store.set(T::COLLECTION, &id, doc).await
    }

    /// Unconditional single-document removal.
    pub async fn delete(&self, id: &str) -> Outcome {
        self.outcome.send_replace(Outcome::Pending);
        let outcome = match self.store.delete(T::COLLECTION, id).await {
            Ok(()) => Outcome::Success(format!("{} deleted successfully", T::LABEL)),
            Err(e) => Outcome::Failure(e.to_string()),
        };
        self.outcome.send_replace(outcome.clone());
        outcome
    }

    /// Flip the completion flag, writing both persisted spellings in one
    /// atomic update so old- and new-style readers stay consistent.
    ///
    /// `current` is the caller's last-seen value; concurrent toggles are
    /// last-write-wins. The returned outcome reports this call's result,
    /// but only failures are written to the shared slot: after a
    /// successful toggle `current_outcome()` keeps its previous value, so
    /// a checkbox tap never flashes a banner and the next snapshot carries
    /// the change.
    pub async fn toggle_completion(&self, id: &str, current: bool) -> Outcome {
        let next = !current;
        tracing::debug!(
            collection = T::COLLECTION,
            id,
            from = current,
            to = next,
            "Toggling completion"
        );

        let mut fields = Map::new();
        fields.insert("isCompleted".to_string(), Value::Bool(next));
        fields.insert("completed".to_string(), Value::Bool(next));

        match self.store.update_fields(T::COLLECTION, id, fields).await {
            Ok(()) => Outcome::Success(format!("{} completion updated", T::LABEL)),
            Err(e) => {
                let outcome = Outcome::Failure(e.to_string());
                self.outcome.send_replace(outcome.clone());
                outcome
            }
        }
    }

    /// Point lookup: the in-memory list first, then a direct store fetch
    /// for items not (yet) streamed, e.g. a deep link.
    pub async fn get_by_id(&self, id: &str) -> Result<T> {
        let cached = self
            .items_rx
            .borrow()
            .iter()
            .find(|item| item.id() == id)
            .cloned();
        if let Some(item) = cached {
            return Ok(item);
        }

        let doc = self
            .store
            .get(T::COLLECTION, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", T::LABEL, id)))?;
        decode_item(&doc)
    }
}

impl<T: WorkoutItem> Drop for ItemProjector<T> {
    fn drop(&mut self) {
        // Cancels the bridge; its driver releases the store subscription
        // and principal watch.
        self.driver.abort();
    }
}
