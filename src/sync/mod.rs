// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live collection sync: subscription bridge plus state projector.

pub mod bridge;
pub mod projector;

pub use bridge::{watch_items, ItemStream};
pub use projector::{ExerciseProjector, ItemProjector, Outcome, RoutineProjector};
