// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitFly Sync: live collection sync core for the FitFly workout tracker.
//!
//! Bridges the backend's push-based document subscriptions into observable,
//! principal-scoped lists of exercises and routines, with one-shot mutation
//! operations whose outcomes are separately observable.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;

pub use auth::{AuthHandle, AuthService, Principal};
pub use error::{AppError, Result};
