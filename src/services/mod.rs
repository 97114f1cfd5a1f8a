// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod anticheat;
pub mod claim;
pub mod grid;
pub mod leaderboard;

pub use activity::{ActivityService, FinishActivityRequest};
pub use claim::{ClaimReceipt, ClaimRequest, ClaimService};
pub use leaderboard::{LeaderboardEntry, LeaderboardService};
