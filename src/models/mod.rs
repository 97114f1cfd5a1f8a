// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod season;
pub mod territory;
pub mod user;

pub use activity::{Activity, ActivityType};
pub use season::Season;
pub use territory::{ClaimEvent, TerritoryCell};
pub use user::User;
