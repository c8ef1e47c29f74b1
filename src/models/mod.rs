// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod analysis;
pub mod user;

pub use analysis::{FoodAnalysis, NewFoodAnalysis};
pub use user::{NewUser, User};
