// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription bridge.
//!
//! Converts the store's push-based snapshot listener into a pull-based
//! stream of typed lists, scoped to the signed-in principal and re-scoped
//! whenever the principal changes:
//!
//! - no principal: emits an empty list and holds no store subscription,
//! - new principal: releases the old subscription, opens one filtered to
//!   `userId == principal.id`,
//! - same principal: no redundant resubscription,
//! - store error: forwarded once, then the stream ends,
//! - dropping the stream releases the principal watch and any subscription.
//!
//! Snapshots are decoded document-by-document (undecodable ones dropped),
//! then sorted by creation time, newest first.

use crate::auth::{AuthService, Principal};
use crate::db::{DocumentStore, Snapshot, Subscription};
use crate::error::Result;
use crate::models::{decode_item, WorkoutItem};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Consumer side of one bridge: a stream of full-list snapshots.
pub struct ItemStream<T> {
    rx: mpsc::UnboundedReceiver<Result<Vec<T>>>,
}

impl<T: WorkoutItem> ItemStream<T> {
    /// Next projected list, an error terminal, or `None` once closed.
    pub async fn next_snapshot(&mut self) -> Option<Result<Vec<T>>> {
        self.rx.recv().await
    }
}

impl<T: WorkoutItem> futures_util::Stream for ItemStream<T> {
    type Item = Result<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Start a bridge for one entity kind.
///
/// The driver task exits, releasing the principal watch and any active
/// store subscription, when the returned stream is dropped or a store error
/// terminates the sequence.
pub fn watch_items<T: WorkoutItem>(
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
) -> ItemStream<T> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_bridge::<T>(auth, store, tx));
    ItemStream { rx }
}

struct ActiveSubscription {
    owner_id: String,
    subscription: Subscription,
}

async fn run_bridge<T: WorkoutItem>(
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
    tx: mpsc::UnboundedSender<Result<Vec<T>>>,
) {
    let mut principal_rx = auth.watch_principal();
    let mut active: Option<ActiveSubscription> = None;

    // Evaluate the current auth state before waiting for transitions.
    let initial = principal_rx.borrow_and_update().clone();
    if !apply_principal::<T>(&store, &tx, &mut active, initial).await {
        return;
    }

    loop {
        tokio::select! {
            changed = principal_rx.changed() => {
                if changed.is_err() {
                    tracing::debug!(collection = T::COLLECTION, "Auth handle dropped, closing bridge");
                    break;
                }
                let principal = principal_rx.borrow_and_update().clone();
                if !apply_principal::<T>(&store, &tx, &mut active, principal).await {
                    break;
                }
            }
            snapshot = recv_snapshot(&mut active) => {
                match snapshot {
                    Some(Ok(docs)) => {
                        let items = project::<T>(&docs);
                        tracing::debug!(
                            collection = T::COLLECTION,
                            count = items.len(),
                            "Snapshot received"
                        );
                        if tx.send(Ok(items)).is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        // Terminal: surface the error and end the sequence.
                        let _ = tx.send(Err(e));
                        break;
                    }
                    None => {
                        // Store closed the subscription without an error.
                        active = None;
                    }
                }
            }
            _ = tx.closed() => break,
        }
    }
}

/// Await the next snapshot of the active subscription, or park forever when
/// there is none (sign-in will swap one in).
async fn recv_snapshot(active: &mut Option<ActiveSubscription>) -> Option<Result<Snapshot>> {
    match active {
        Some(sub) => sub.subscription.recv().await,
        None => futures_util::future::pending().await,
    }
}

/// Reconcile the subscription with the observed principal.
///
/// Returns `false` when the bridge must terminate (consumer gone or the
/// store refused the new subscription).
async fn apply_principal<T: WorkoutItem>(
    store: &Arc<dyn DocumentStore>,
    tx: &mpsc::UnboundedSender<Result<Vec<T>>>,
    active: &mut Option<ActiveSubscription>,
    principal: Option<Principal>,
) -> bool {
    match principal {
        None => {
            if active.take().is_some() {
                tracing::debug!(
                    collection = T::COLLECTION,
                    "Principal signed out, released subscription"
                );
            }
            tx.send(Ok(Vec::new())).is_ok()
        }
        Some(principal) => {
            if active.as_ref().is_some_and(|a| a.owner_id == principal.id) {
                // Already scoped to this principal.
                return true;
            }
            // Drop the old subscription before opening the new one so a
            // stale snapshot for a superseded principal can never land.
            active.take();
            match store.subscribe(T::COLLECTION, &principal.id).await {
                Ok(subscription) => {
                    tracing::debug!(
                        collection = T::COLLECTION,
                        user_id = %principal.id,
                        "Subscribed"
                    );
                    *active = Some(ActiveSubscription {
                        owner_id: principal.id,
                        subscription,
                    });
                    true
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    false
                }
            }
        }
    }
}

/// Map one store snapshot into the projected list: decode-tolerant per
/// document, sorted by creation time descending. The sort is stable, so
/// items with equal timestamps keep their snapshot order.
fn project<T: WorkoutItem>(snapshot: &Snapshot) -> Vec<T> {
    let mut items: Vec<T> = snapshot
        .iter()
        .filter_map(|doc| match decode_item::<T>(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable document from snapshot");
                None
            }
        })
        .collect();
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    items
}
