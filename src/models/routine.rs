// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout routine model.

use crate::models::geo::GeoTag;
use crate::models::item::WorkoutItem;
use serde::{Deserialize, Serialize};

/// A workout routine referencing a list of exercises.
///
/// `exercise_ids` are soft references: deleting a routine never deletes the
/// exercises it points at, and deleting an exercise may leave dangling ids
/// here. Readers are expected to skip ids that no longer resolve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    /// Document id; empty until the store assigns one on creation.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercise_ids: Vec<String>,
    #[serde(default)]
    pub required_equipment: Vec<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub image_uri: Option<String>,
    /// Owning principal id; always stamped by the sync layer at write time.
    #[serde(default)]
    pub user_id: String,
    /// Creation time in epoch millis, set once at creation.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub geo_tag: Option<GeoTag>,
}

impl WorkoutItem for Routine {
    const COLLECTION: &'static str = crate::db::collections::ROUTINES;
    const LABEL: &'static str = "Routine";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn set_user_id(&mut self, user_id: String) {
        self.user_id = user_id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn set_created_at(&mut self, millis: i64) {
        self.created_at = millis;
    }

    fn is_completed(&self) -> bool {
        self.is_completed
    }

    fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
    }
}
