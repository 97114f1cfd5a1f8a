// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Anti-cheat speed validation.
//!
//! Pure function of (activity type, distance, duration); no storage
//! knowledge and no side effects. Invoked when an activity is finished and
//! again by the claim resolver before any ownership change.

use crate::models::ActivityType;

/// Maximum plausible average speed for running (~15 mph elite sprint).
pub const MAX_RUN_KMH: f64 = 24.0;
/// Maximum plausible average speed for walking (~6 mph fast walk).
pub const MAX_WALK_KMH: f64 = 10.0;
/// Maximum plausible average speed for cycling (~37 mph descent/sprint).
pub const MAX_RIDE_KMH: f64 = 60.0;

/// Speed ceiling for an activity type, in km/h.
pub fn speed_ceiling_kmh(activity_type: ActivityType) -> f64 {
    match activity_type {
        ActivityType::Run => MAX_RUN_KMH,
        ActivityType::Walk => MAX_WALK_KMH,
        ActivityType::Ride => MAX_RIDE_KMH,
    }
}

/// A rejected activity: average speed above the per-type ceiling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{activity_type} speed {speed_kmh:.1} km/h exceeds the {limit_kmh} km/h limit")]
pub struct SpeedViolation {
    pub activity_type: ActivityType,
    pub speed_kmh: f64,
    pub limit_kmh: f64,
}

/// Validate an activity's average speed against the per-type ceiling.
///
/// An activity with zero (or negative) distance or duration is exempt: it
/// carries no claim weight, so there is nothing to cheat with. Speed equal
/// to the ceiling passes; strictly greater fails.
pub fn validate_speed(
    activity_type: ActivityType,
    distance_meters: f64,
    duration_seconds: f64,
) -> Result<(), SpeedViolation> {
    if distance_meters <= 0.0 || duration_seconds <= 0.0 {
        return Ok(());
    }

    let speed_kmh = (distance_meters / 1000.0) / (duration_seconds / 3600.0);
    let limit_kmh = speed_ceiling_kmh(activity_type);

    if speed_kmh > limit_kmh {
        return Err(SpeedViolation {
            activity_type,
            speed_kmh,
            limit_kmh,
        });
    }

    Ok(())
}
