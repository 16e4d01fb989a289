// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External service clients.

pub mod cloudinary;

pub use cloudinary::CloudinaryClient;
