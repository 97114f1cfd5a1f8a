// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity lifecycle: start, finish-once, anti-cheat gating, track cells.

use hexclaim::error::AppError;
use hexclaim::models::ActivityType;
use hexclaim::services::grid;
use hexclaim::services::FinishActivityRequest;
use serde_json::json;

mod common;

fn finish_request(distance: f64, duration: f64) -> FinishActivityRequest {
    FinishActivityRequest {
        distance_meters: distance,
        duration_seconds: duration,
        track: None,
        private: None,
    }
}

#[tokio::test]
async fn test_start_creates_open_activity() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Ride)
        .await
        .unwrap();

    assert!(!activity.is_closed());
    assert_eq!(activity.user_id, "u1");
    assert_eq!(activity.distance_meters, 0.0);

    let stored = state.db.get_activity(&activity.activity_id).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_finish_closes_activity_with_track() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Run)
        .await
        .unwrap();

    let request = FinishActivityRequest {
        distance_meters: 5_000.0,
        duration_seconds: 1_800.0,
        track: Some(json!({
            "type": "LineString",
            "coordinates": [[-122.42, 37.78], [-122.41, 37.79]]
        })),
        private: Some(true),
    };

    let finished = state
        .activity_service
        .finish("u1", &activity.activity_id, &request)
        .await
        .unwrap();

    assert!(finished.is_closed());
    assert!(finished.end_ts.unwrap() > finished.start_ts);
    assert_eq!(finished.distance_meters, 5_000.0);
    assert_eq!(finished.duration_seconds, 1_800.0);
    assert!(finished.track_polyline.is_some());
    assert!(finished.private);
}

#[tokio::test]
async fn test_finish_twice_rejected() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Walk)
        .await
        .unwrap();

    state
        .activity_service
        .finish("u1", &activity.activity_id, &finish_request(2_000.0, 1_800.0))
        .await
        .unwrap();

    let err = state
        .activity_service
        .finish("u1", &activity.activity_id, &finish_request(2_000.0, 1_800.0))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_finish_rejects_implausible_speed_and_stays_open() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Run)
        .await
        .unwrap();

    // Just over the 24 km/h running ceiling.
    let err = state
        .activity_service
        .finish("u1", &activity.activity_id, &finish_request(10_001.0, 1_500.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SpeedLimit(_)));

    let stored = state
        .db
        .get_activity(&activity.activity_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_closed(), "rejected finish must not close");
}

#[tokio::test]
async fn test_finish_at_speed_ceiling_passes() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Run)
        .await
        .unwrap();

    // Exactly 24 km/h: boundary is inclusive.
    let finished = state
        .activity_service
        .finish("u1", &activity.activity_id, &finish_request(10_000.0, 1_500.0))
        .await
        .unwrap();
    assert!(finished.is_closed());
}

#[tokio::test]
async fn test_finish_zero_distance_exempt_from_speed_check() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Run)
        .await
        .unwrap();

    let finished = state
        .activity_service
        .finish("u1", &activity.activity_id, &finish_request(0.0, 0.0))
        .await
        .unwrap();
    assert!(finished.is_closed());
}

#[tokio::test]
async fn test_finish_foreign_activity_forbidden() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;
    common::seed_user(&state.db, "u2", "Bob", "#00FF00").await;
    common::seed_open_activity(&state.db, "a2", "u2", ActivityType::Run).await;

    let err = state
        .activity_service
        .finish("u1", "a2", &finish_request(1_000.0, 600.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_track_cells_cover_the_recorded_path() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let activity = state
        .activity_service
        .start("u1", ActivityType::Run)
        .await
        .unwrap();

    let request = FinishActivityRequest {
        distance_meters: 3_000.0,
        duration_seconds: 1_800.0,
        track: Some(json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[-122.42, 37.78], [-122.41, 37.79], [-122.40, 37.80]]
            }
        })),
        private: None,
    };
    state
        .activity_service
        .finish("u1", &activity.activity_id, &request)
        .await
        .unwrap();

    let cells = state
        .activity_service
        .track_cells("u1", &activity.activity_id, 9)
        .await
        .unwrap();

    assert!(!cells.is_empty());
    assert!(cells.contains(&grid::cell_for_point(37.78, -122.42, 9).unwrap()));
    assert!(cells.contains(&grid::cell_for_point(37.80, -122.40, 9).unwrap()));
}

#[tokio::test]
async fn test_track_cells_without_track_rejected() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;
    common::seed_closed_activity(&state.db, "a1", "u1", ActivityType::Run, 5_000.0, 1_800.0).await;

    let err = state
        .activity_service
        .track_cells("u1", "a1", 9)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_list_returns_newest_first_with_pagination() {
    let state = common::build_state(common::test_db_memory());
    common::seed_user(&state.db, "u1", "Alice", "#FF0000").await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let activity = state
            .activity_service
            .start("u1", ActivityType::Walk)
            .await
            .unwrap();
        ids.push(activity.activity_id);
        // Make start timestamps strictly ordered
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let page = state.activity_service.list("u1", 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].activity_id, ids[2], "newest first");
    assert_eq!(page[1].activity_id, ids[1]);

    let rest = state.activity_service.list("u1", 2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].activity_id, ids[0]);
}
