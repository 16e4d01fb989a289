// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fixtures for the sync tests.

use fitfly_sync::auth::AuthHandle;
use fitfly_sync::db::{collections, DocumentStore, MemoryStore};
use fitfly_sync::models::{Exercise, Routine, WorkoutItem};
use fitfly_sync::sync::ItemStream;
use std::sync::Arc;
use std::time::Duration;

/// Fresh signed-out auth handle and empty store.
#[allow(dead_code)]
pub fn setup() -> (Arc<AuthHandle>, Arc<MemoryStore>) {
    (Arc::new(AuthHandle::new()), Arc::new(MemoryStore::new()))
}

/// Insert an exercise document directly into the store, bypassing the
/// projector, and return its id.
#[allow(dead_code)]
pub async fn seed_exercise(
    store: &MemoryStore,
    user_id: &str,
    name: &str,
    created_at: i64,
) -> String {
    store
        .create(
            collections::EXERCISES,
            serde_json::json!({
                "name": name,
                "sets": 3,
                "reps": 10,
                "instructions": "",
                "requiredEquipment": [],
                "isCompleted": false,
                "completed": false,
                "userId": user_id,
                "createdAt": created_at,
            }),
        )
        .await
        .expect("seed exercise")
}

/// An exercise as a caller would construct it before `add`.
#[allow(dead_code)]
pub fn sample_exercise(name: &str) -> Exercise {
    Exercise {
        name: name.to_string(),
        sets: 3,
        reps: 12,
        instructions: "Keep your back straight".to_string(),
        ..Default::default()
    }
}

/// A routine as a caller would construct it before `add`.
#[allow(dead_code)]
pub fn sample_routine(name: &str, exercise_ids: Vec<String>) -> Routine {
    Routine {
        name: name.to_string(),
        description: "Test routine".to_string(),
        exercise_ids,
        ..Default::default()
    }
}

/// Next successful snapshot from a bridge stream, with a timeout.
#[allow(dead_code)]
pub async fn next_list<T: WorkoutItem>(stream: &mut ItemStream<T>) -> Vec<T> {
    tokio::time::timeout(Duration::from_secs(2), stream.next_snapshot())
        .await
        .expect("timed out waiting for snapshot")
        .expect("stream ended unexpectedly")
        .expect("snapshot error")
}

/// Poll a condition until it holds (or fail after two seconds). The store's
/// watcher reaping and the projector's driver run as background tasks, so
/// assertions on their side effects need a grace period.
#[allow(dead_code)]
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}
