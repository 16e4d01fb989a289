// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription bridge behavior: principal scoping, resubscription
//! accounting, ordering, schema drift, and error propagation.

use fitfly_sync::db::{collections, DocumentStore};
use fitfly_sync::models::Exercise;
use fitfly_sync::sync::watch_items;
use fitfly_sync::{AppError, Principal};

mod common;
use common::{next_list, seed_exercise, setup, wait_until};

#[tokio::test]
async fn test_signed_out_start_emits_empty_without_subscribing() {
    let (auth, store) = setup();

    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());

    assert!(next_list(&mut stream).await.is_empty());
    assert_eq!(store.subscribe_count(), 0);
}

#[tokio::test]
async fn test_login_emits_owner_scoped_snapshot_newest_first() {
    let (auth, store) = setup();
    seed_exercise(&store, "u1", "Old", 100).await;
    seed_exercise(&store, "u1", "New", 200).await;
    seed_exercise(&store, "u2", "Other", 300).await;

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());

    let items = next_list(&mut stream).await;
    let names: Vec<&str> = items.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["New", "Old"]);
    assert!(items.iter().all(|e| e.user_id == "u1"));
}

#[tokio::test]
async fn test_logout_emits_empty_and_releases_subscription() {
    let (auth, store) = setup();
    seed_exercise(&store, "u1", "Squats", 100).await;

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());
    assert_eq!(next_list(&mut stream).await.len(), 1);

    auth.sign_out();
    assert!(next_list(&mut stream).await.is_empty());

    wait_until(|| store.release_count() == 1).await;
    assert_eq!(store.subscribe_count(), 1);
}

#[tokio::test]
async fn test_principal_switch_rescopes_to_new_owner() {
    let (auth, store) = setup();
    seed_exercise(&store, "u1", "Mine", 100).await;
    seed_exercise(&store, "u2", "Theirs", 200).await;

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());
    assert_eq!(next_list(&mut stream).await[0].name, "Mine");

    // Direct account switch, no intermediate sign-out.
    auth.sign_in(Principal::with_id("u2"));
    let items = next_list(&mut stream).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Theirs");

    assert_eq!(store.subscribe_count(), 2);
    wait_until(|| store.release_count() == 1).await;
}

#[tokio::test]
async fn test_same_principal_does_not_resubscribe() {
    let (auth, store) = setup();
    seed_exercise(&store, "u1", "Squats", 100).await;

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());
    assert_eq!(next_list(&mut stream).await.len(), 1);

    // The auth provider may re-deliver the same principal.
    auth.sign_in(Principal::with_id("u1"));

    // The existing subscription keeps flowing.
    seed_exercise(&store, "u1", "Lunges", 200).await;
    wait_until(|| store.subscribe_count() == 1 && store.release_count() == 0).await;
    let items = next_list(&mut stream).await;
    assert_eq!(items.len(), 2);
    assert_eq!(store.subscribe_count(), 1);
}

#[tokio::test]
async fn test_dropping_stream_releases_exactly_once() {
    let (auth, store) = setup();
    auth.sign_in(Principal::with_id("u1"));

    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());
    assert!(next_list(&mut stream).await.is_empty());
    assert_eq!(store.subscribe_count(), 1);

    drop(stream);

    wait_until(|| store.release_count() == 1).await;
    assert_eq!(store.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_full_principal_cycle_balances_subscriptions() {
    let (auth, store) = setup();

    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());
    assert!(next_list(&mut stream).await.is_empty());

    auth.sign_in(Principal::with_id("u1"));
    next_list(&mut stream).await;
    auth.sign_in(Principal::with_id("u2"));
    next_list(&mut stream).await;
    auth.sign_out();
    assert!(next_list(&mut stream).await.is_empty());
    drop(stream);

    // One subscription per distinct principal, all released.
    wait_until(|| store.release_count() == 2).await;
    assert_eq!(store.subscribe_count(), 2);
}

#[tokio::test]
async fn test_store_error_terminates_stream() {
    let (auth, store) = setup();
    auth.sign_in(Principal::with_id("u1"));

    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());
    assert!(next_list(&mut stream).await.is_empty());

    store.emit_error(collections::EXERCISES, "connection reset");

    match stream.next_snapshot().await {
        Some(Err(AppError::Store(msg))) => assert_eq!(msg, "connection reset"),
        other => panic!("expected store error, got {:?}", other.map(|r| r.map(|v| v.len()))),
    }
    // Terminal: nothing follows the error.
    assert!(stream.next_snapshot().await.is_none());

    wait_until(|| store.release_count() == 1).await;
}

#[tokio::test]
async fn test_completion_fallback_flows_through_bridge() {
    let (auth, store) = setup();
    store
        .create(
            collections::EXERCISES,
            serde_json::json!({
                "name": "Legacy",
                "completed": true,
                "userId": "u1",
                "createdAt": 100,
            }),
        )
        .await
        .unwrap();

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());

    let items = next_list(&mut stream).await;
    assert!(items[0].is_completed);
}

#[tokio::test]
async fn test_undecodable_documents_are_dropped_from_list() {
    let (auth, store) = setup();
    seed_exercise(&store, "u1", "Good", 100).await;
    store
        .create(
            collections::EXERCISES,
            serde_json::json!({
                "name": "Broken",
                "userId": "u1",
                "createdAt": "not-a-timestamp",
            }),
        )
        .await
        .unwrap();

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());

    let items = next_list(&mut stream).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Good");
}

#[tokio::test]
async fn test_equal_timestamps_keep_snapshot_order_within_one_snapshot() {
    let (auth, store) = setup();
    let first = seed_exercise(&store, "u1", "A", 100).await;
    let second = seed_exercise(&store, "u1", "B", 100).await;

    auth.sign_in(Principal::with_id("u1"));
    let mut stream = watch_items::<Exercise>(auth.clone(), store.clone());

    let snapshot_a = next_list(&mut stream).await;
    // Force a second snapshot with the same two documents.
    seed_exercise(&store, "u1", "C", 50).await;
    let snapshot_b = next_list(&mut stream).await;

    let order_a: Vec<&str> = snapshot_a
        .iter()
        .filter(|e| e.created_at == 100)
        .map(|e| e.id.as_str())
        .collect();
    let order_b: Vec<&str> = snapshot_b
        .iter()
        .filter(|e| e.created_at == 100)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(order_a, order_b);
    assert!(order_a.contains(&first.as_str()));
    assert!(order_a.contains(&second.as_str()));
    // The older item sorts after both equal-timestamp items.
    assert_eq!(snapshot_b.last().unwrap().name, "C");
}
