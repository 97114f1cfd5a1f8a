// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use hexclaim::config::Config;
use hexclaim::db::FirestoreDb;
use hexclaim::middleware::auth::create_jwt;
use hexclaim::models::{Activity, ActivityType, Season, User};
use hexclaim::routes::create_router;
use hexclaim::services::{ActivityService, ClaimService, LeaderboardService};
use hexclaim::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db_emulator() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create an in-memory database.
#[allow(dead_code)]
pub fn test_db_memory() -> FirestoreDb {
    FirestoreDb::new_in_memory()
}

/// Create a mock database connection (offline, errors on use).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build shared state around a database.
#[allow(dead_code)]
pub fn build_state(db: FirestoreDb) -> Arc<AppState> {
    Arc::new(AppState {
        config: Config::test_default(),
        db: db.clone(),
        activity_service: ActivityService::new(db.clone()),
        claim_service: ClaimService::new(db.clone()),
        leaderboard_service: LeaderboardService::new(db),
    })
}

/// Create a test app backed by the in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(test_db_memory());
    (create_router(state.clone()), state)
}

/// Mint a Bearer header value for a user.
#[allow(dead_code)]
pub fn bearer(config: &Config, user_id: &str) -> String {
    let token = create_jwt(user_id, &config.jwt_signing_key).expect("Failed to mint JWT");
    format!("Bearer {}", token)
}

/// Seed a user profile.
#[allow(dead_code)]
pub async fn seed_user(db: &FirestoreDb, user_id: &str, display_name: &str, color: &str) -> User {
    let user = User {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        color: color.to_string(),
        is_active: true,
        created_at: chrono::Utc::now(),
    };
    db.upsert_user(&user).await.expect("Failed to seed user");
    user
}

/// Seed a season.
#[allow(dead_code)]
pub async fn seed_season(db: &FirestoreDb, season_id: &str, is_active: bool) -> Season {
    let season = Season {
        season_id: season_id.to_string(),
        name: format!("Season {}", season_id),
        start_ts: chrono::Utc::now() - chrono::Duration::days(7),
        end_ts: chrono::Utc::now() + chrono::Duration::days(7),
        is_active,
    };
    db.upsert_season(&season)
        .await
        .expect("Failed to seed season");
    season
}

/// Seed an already-finished activity with the given stats.
#[allow(dead_code)]
pub async fn seed_closed_activity(
    db: &FirestoreDb,
    activity_id: &str,
    user_id: &str,
    activity_type: ActivityType,
    distance_meters: f64,
    duration_seconds: f64,
) -> Activity {
    let start_ts = chrono::Utc::now() - chrono::Duration::hours(1);
    let activity = Activity {
        activity_id: activity_id.to_string(),
        user_id: user_id.to_string(),
        activity_type,
        start_ts,
        end_ts: Some(start_ts + chrono::Duration::seconds(duration_seconds.max(1.0) as i64)),
        distance_meters,
        duration_seconds,
        track_polyline: None,
        private: false,
    };
    db.set_activity(&activity)
        .await
        .expect("Failed to seed activity");
    activity
}

/// Seed an open (unfinished) activity.
#[allow(dead_code)]
pub async fn seed_open_activity(
    db: &FirestoreDb,
    activity_id: &str,
    user_id: &str,
    activity_type: ActivityType,
) -> Activity {
    let activity = Activity {
        activity_id: activity_id.to_string(),
        user_id: user_id.to_string(),
        activity_type,
        start_ts: chrono::Utc::now(),
        end_ts: None,
        distance_meters: 0.0,
        duration_seconds: 0.0,
        track_polyline: None,
        private: false,
    };
    db.set_activity(&activity)
        .await
        .expect("Failed to seed activity");
    activity
}
