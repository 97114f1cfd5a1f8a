// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity type. The enum is closed: unknown values are rejected at
/// deserialization time, before they reach any validation or storage code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Run,
    Walk,
    Ride,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityType::Run => "RUN",
            ActivityType::Walk => "WALK",
            ActivityType::Ride => "RIDE",
        };
        f.write_str(s)
    }
}

/// Stored activity record in Firestore.
///
/// An activity is "open" while `end_ts` is `None` and closes exactly once.
/// Distance and duration are only meaningful once closed; they are the
/// immutable inputs to the anti-cheat speed check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Activity id (also used as document ID)
    pub activity_id: String,
    /// Owning user id
    pub user_id: String,
    /// RUN, WALK or RIDE
    pub activity_type: ActivityType,
    /// When the user started the activity
    pub start_ts: DateTime<Utc>,
    /// When the activity was finished (None while still open)
    pub end_ts: Option<DateTime<Utc>>,
    /// Distance in meters
    pub distance_meters: f64,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Recorded GPS track, polyline-encoded (precision 5)
    pub track_polyline: Option<String>,
    /// Whether the activity is hidden from other users
    pub private: bool,
}

impl Activity {
    /// Whether the activity has been finished.
    pub fn is_closed(&self) -> bool {
        self.end_ts.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_serde_screaming_case() {
        assert_eq!(serde_json::to_string(&ActivityType::Run).unwrap(), "\"RUN\"");
        assert_eq!(
            serde_json::from_str::<ActivityType>("\"RIDE\"").unwrap(),
            ActivityType::Ride
        );
    }

    #[test]
    fn test_activity_type_rejects_unknown() {
        let result = serde_json::from_str::<ActivityType>("\"SWIM\"");
        assert!(result.is_err(), "Unknown activity type must not deserialize");
    }

    #[test]
    fn test_is_closed() {
        let mut activity = Activity {
            activity_id: "a1".to_string(),
            user_id: "u1".to_string(),
            activity_type: ActivityType::Run,
            start_ts: chrono::Utc::now(),
            end_ts: None,
            distance_meters: 0.0,
            duration_seconds: 0.0,
            track_polyline: None,
            private: false,
        };
        assert!(!activity.is_closed());

        activity.end_ts = Some(chrono::Utc::now());
        assert!(activity.is_closed());
    }
}
