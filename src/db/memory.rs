// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Full implementation of the [`DocumentStore`] contract backed by process
//! memory: per-collection document maps with snapshot fan-out to watchers.
//! Used by the test suite and for local development without an emulator.
//! Carries subscribe/release counters and failure-injection hooks so tests
//! can assert resource accounting and error paths.

use crate::db::{document_owner, DocumentStore, RawDocument, Snapshot, Subscription};
use crate::error::{AppError, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// In-memory [`DocumentStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    stats: Arc<Stats>,
}

#[derive(Default)]
struct Stats {
    subscribed: AtomicUsize,
    released: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Value>>,
    watchers: Vec<Watcher>,
    next_watcher_id: u64,
    fail_next_write: Option<String>,
}

struct Watcher {
    id: u64,
    collection: String,
    owner_id: String,
    tx: mpsc::UnboundedSender<Result<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total subscriptions opened so far.
    pub fn subscribe_count(&self) -> usize {
        self.stats.subscribed.load(Ordering::SeqCst)
    }

    /// Total subscriptions released so far.
    pub fn release_count(&self) -> usize {
        self.stats.released.load(Ordering::SeqCst)
    }

    /// Subscriptions currently live.
    pub fn active_subscriptions(&self) -> usize {
        self.subscribe_count() - self.release_count()
    }

    /// Raw stored fields of one document, for test assertions.
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection, for test assertions.
    pub fn collection_size(&self, collection: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// Make the next write operation fail with the given message.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.inner.lock().unwrap().fail_next_write = Some(message.into());
    }

    /// Push a terminal error to every watcher of a collection, simulating a
    /// store-side subscription failure.
    pub fn emit_error(&self, collection: &str, message: impl Into<String>) {
        let message = message.into();
        let inner = self.inner.lock().unwrap();
        for watcher in inner.watchers.iter().filter(|w| w.collection == collection) {
            let _ = watcher.tx.send(Err(AppError::Store(message.clone())));
        }
    }

    fn take_write_failure(inner: &mut Inner) -> Result<()> {
        match inner.fail_next_write.take() {
            Some(message) => Err(AppError::Store(message)),
            None => Ok(()),
        }
    }

    fn snapshot_for(inner: &Inner, collection: &str, owner_id: &str) -> Snapshot {
        inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| document_owner(data) == Some(owner_id))
                    .map(|(id, data)| RawDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(inner: &Inner, collection: &str) {
        for watcher in inner.watchers.iter().filter(|w| w.collection == collection) {
            let snapshot = Self::snapshot_for(inner, collection, &watcher.owner_id);
            // A closed channel just means the watcher is about to be reaped.
            let _ = watcher.tx.send(Ok(snapshot));
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self, collection: &str, owner_id: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher_id = {
            let mut inner = self.inner.lock().unwrap();
            let watcher_id = inner.next_watcher_id;
            inner.next_watcher_id += 1;
            inner.watchers.push(Watcher {
                id: watcher_id,
                collection: collection.to_string(),
                owner_id: owner_id.to_string(),
                tx: tx.clone(),
            });
            let _ = tx.send(Ok(Self::snapshot_for(&inner, collection, owner_id)));
            watcher_id
        };
        self.stats.subscribed.fetch_add(1, Ordering::SeqCst);

        // Reap the watcher once the consumer drops the subscription handle.
        let inner = Arc::clone(&self.inner);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            tx.closed().await;
            inner.lock().unwrap().watchers.retain(|w| w.id != watcher_id);
            stats.released.fetch_add(1, Ordering::SeqCst);
        });

        Ok(Subscription::new(rx))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| RawDocument {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut inner = self.inner.lock().unwrap();
        Self::take_write_failure(&mut inner)?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Self::notify(&inner, collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_write_failure(&mut inner)?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Self::notify(&inner, collection);
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_write_failure(&mut inner)?;
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| AppError::Store(format!("no document {}/{}", collection, id)))?;
        match doc.as_object_mut() {
            Some(map) => {
                for (key, value) in fields {
                    map.insert(key, value);
                }
            }
            None => return Err(AppError::Store(format!("document {} is not a map", id))),
        }
        Self::notify(&inner, collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_write_failure(&mut inner)?;
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        Self::notify(&inner, collection);
        Ok(())
    }
}
