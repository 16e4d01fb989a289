// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitFly Sync watcher
//!
//! Headless debugging tool: tails one user's exercise and routine
//! collections live and logs every snapshot. Useful for inspecting what a
//! deployed mobile client is seeing.
//!
//! Usage: fitfly-sync <user-id>

use fitfly_sync::{
    config::Config,
    db::FirestoreStore,
    models::{Exercise, Routine},
    sync::ItemProjector,
    AuthHandle, Principal,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    let user_id = std::env::args()
        .nth(1)
        .expect("usage: fitfly-sync <user-id>");
    tracing::info!(user_id = %user_id, "Starting FitFly sync watcher");

    let store = Arc::new(
        FirestoreStore::new(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
    );
    let auth = Arc::new(AuthHandle::new());

    let exercises = ItemProjector::<Exercise>::new(auth.clone(), store.clone());
    let routines = ItemProjector::<Routine>::new(auth.clone(), store.clone());

    auth.sign_in(Principal::with_id(user_id));

    let mut exercise_rx = exercises.items();
    let mut routine_rx = routines.items();
    let mut exercise_outcome = exercises.outcome();
    let mut routine_outcome = routines.outcome();

    loop {
        tokio::select! {
            changed = exercise_rx.changed() => {
                changed?;
                log_snapshot("exercises", exercise_rx.borrow().iter().map(|e| e.name.clone()));
            }
            changed = routine_rx.changed() => {
                changed?;
                log_snapshot("routines", routine_rx.borrow().iter().map(|r| r.name.clone()));
            }
            changed = exercise_outcome.changed() => {
                changed?;
                tracing::warn!(outcome = ?*exercise_outcome.borrow(), "Exercise sync outcome");
            }
            changed = routine_outcome.changed() => {
                changed?;
                tracing::warn!(outcome = ?*routine_outcome.borrow(), "Routine sync outcome");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn log_snapshot(collection: &str, names: impl Iterator<Item = String>) {
    let names: Vec<String> = names.collect();
    tracing::info!(collection, count = names.len(), items = ?names, "Snapshot");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitfly_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
