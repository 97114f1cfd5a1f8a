// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Hexclaim: turn runs, walks and rides into hexagonal territory.
//!
//! This crate provides the backend API for the territory claim game:
//! activities are recorded and speed-checked, their tracks are discretized
//! into H3 cells, and claims resolve cell ownership within seasons.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{ActivityService, ClaimService, LeaderboardService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub activity_service: ActivityService,
    pub claim_service: ClaimService,
    pub leaderboard_service: LeaderboardService,
}
