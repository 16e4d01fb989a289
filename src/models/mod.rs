// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for synced workout entities.

pub mod exercise;
pub mod geo;
pub mod item;
pub mod routine;

pub use exercise::Exercise;
pub use geo::{GeoTag, LocationType};
pub use item::{decode_item, WorkoutItem};
pub use routine::Routine;
