// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location tag embedded in workout items.

use serde::{Deserialize, Serialize};

/// A geographical location tag (gym, yoga studio, park, ...).
///
/// Owned by value inside a workout item, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoTag {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub address: String,
}

/// Types of locations that can be tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    #[default]
    Gym,
    YogaStudio,
    Park,
    Home,
    Other,
}
