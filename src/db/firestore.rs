// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Production implementation of [`DocumentStore`] on the `firestore` crate:
//! fluent CRUD plus realtime snapshot subscriptions via the listen API.
//! Documents cross this boundary as raw `serde_json::Value` maps; typed
//! decoding happens in the sync layer.

use crate::db::{store_err, DocumentStore, RawDocument, Snapshot, Subscription};
use crate::error::Result;
use firestore::{
    FirestoreDb, FirestoreDocument, FirestoreListenEvent, FirestoreListenerTarget,
    FirestoreMemListenStateStorage,
};
use gcloud_sdk::google::firestore::v1::target_change::TargetChangeType;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Firestore [`DocumentStore`] implementation.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirestoreDb,
    next_target: Arc<AtomicU32>,
}

impl FirestoreStore {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::connect_emulator(project_id).await;
        }

        let client = FirestoreDb::new(project_id)
            .await
            .map_err(|e| crate::error::AppError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client,
            next_target: Arc::new(AtomicU32::new(1)),
        })
    }

    /// Connect to the Firestore emulator with unauthenticated access.
    async fn connect_emulator(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without
        // needing a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            crate::error::AppError::Store(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client,
            next_target: Arc::new(AtomicU32::new(1)),
        })
    }
}

/// Convert a Firestore document into the store-neutral representation.
fn raw_from_firestore(doc: &FirestoreDocument) -> Result<RawDocument> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let data: Value = FirestoreDb::deserialize_doc_to(doc).map_err(store_err)?;
    Ok(RawDocument { id, data })
}

/// Document id from a full Firestore document path.
fn id_from_path(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Accumulates listen events into complete snapshots.
///
/// The initial backlog arrives as individual document changes after the
/// target is marked ADD; only the server's CURRENT marker signals that the
/// set is complete. Emission is held until then so consumers see one full
/// snapshot instead of a growing prefix.
struct SnapshotAccumulator {
    docs: BTreeMap<String, RawDocument>,
    synced: bool,
}

impl SnapshotAccumulator {
    fn new() -> Self {
        Self {
            docs: BTreeMap::new(),
            synced: false,
        }
    }

    fn upsert(&mut self, doc: RawDocument) -> Option<Snapshot> {
        self.docs.insert(doc.id.clone(), doc);
        self.emit()
    }

    fn remove(&mut self, id: &str) -> Option<Snapshot> {
        self.docs.remove(id);
        self.emit()
    }

    /// Only CURRENT opens the gate; ADD, NO_CHANGE and friends arrive
    /// before or between backlog changes and must not.
    fn target_change(&mut self, change_type: TargetChangeType) -> Option<Snapshot> {
        if self.synced || change_type != TargetChangeType::Current {
            return None;
        }
        self.synced = true;
        self.emit()
    }

    fn emit(&self) -> Option<Snapshot> {
        self.synced.then(|| self.docs.values().cloned().collect())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn subscribe(&self, collection: &str, owner_id: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel::<Result<Snapshot>>();

        let mut listener = self
            .client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(store_err)?;

        let target = FirestoreListenerTarget::new(self.next_target.fetch_add(1, Ordering::SeqCst));
        let owner = owner_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field("userId").eq(owner.clone())]))
            .listen()
            .add_target(target, &mut listener)
            .map_err(store_err)?;

        tracing::debug!(collection, owner_id, "Opening Firestore subscription");

        let session = Arc::new(Mutex::new(SnapshotAccumulator::new()));

        let event_tx = tx.clone();
        listener
            .start(move |event| {
                let session = session.clone();
                let tx = event_tx.clone();
                async move {
                    let snapshot = match event {
                        FirestoreListenEvent::DocumentChange(change) => match change.document {
                            Some(doc) => match raw_from_firestore(&doc) {
                                Ok(raw) => session.lock().unwrap().upsert(raw),
                                Err(e) => {
                                    tracing::warn!(error = %e, "Skipping undecodable change event");
                                    None
                                }
                            },
                            None => None,
                        },
                        FirestoreListenEvent::DocumentDelete(deleted) => session
                            .lock()
                            .unwrap()
                            .remove(&id_from_path(&deleted.document)),
                        FirestoreListenEvent::DocumentRemove(removed) => session
                            .lock()
                            .unwrap()
                            .remove(&id_from_path(&removed.document)),
                        FirestoreListenEvent::TargetChange(tc) => session
                            .lock()
                            .unwrap()
                            .target_change(tc.target_change_type()),
                        _ => None,
                    };
                    if let Some(snapshot) = snapshot {
                        let _ = tx.send(Ok(snapshot));
                    }
                    Ok(())
                }
            })
            .await
            .map_err(store_err)?;

        // Shut the listener down once the consumer drops the subscription.
        tokio::spawn(async move {
            tx.closed().await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Firestore listener shutdown failed");
            }
        });

        Ok(Subscription::new(rx))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>> {
        let doc: Option<FirestoreDocument> = self
            .client
            .fluent()
            .select()
            .by_id_in(collection)
            .one(id)
            .await
            .map_err(store_err)?;

        doc.as_ref().map(raw_from_firestore).transpose()
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        // The store assigns the id; callers see documents keyed by it from
        // the next snapshot on.
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set(collection, &id, data).await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&data)
            .execute()
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let field_names: Vec<String> = fields.keys().cloned().collect();
        let _: () = self
            .client
            .fluent()
            .update()
            .fields(field_names)
            .in_col(collection)
            .document_id(id)
            .object(&Value::Object(fields))
            .execute()
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
