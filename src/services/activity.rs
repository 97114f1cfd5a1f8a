// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity lifecycle service.
//!
//! Handles the core workflow:
//! 1. Start an activity (open, no end timestamp)
//! 2. Finish it exactly once with distance/duration and an optional track
//! 3. Gate the finish through the anti-cheat speed check
//! 4. Derive claimable grid cells from the recorded track

use crate::db::{new_document_id, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityType};
use crate::services::{anticheat, grid};
use geo::LineString;
use geojson::GeoJson;
use serde::Deserialize;
use std::collections::BTreeSet;
use validator::Validate;

/// Polyline precision used for stored tracks (5 decimal places, ~1 m).
const TRACK_PRECISION: u32 = 5;

/// Request body for finishing an activity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FinishActivityRequest {
    #[validate(range(min = 0.0, message = "distance cannot be negative"))]
    pub distance_meters: f64,
    #[validate(range(min = 0.0, message = "duration cannot be negative"))]
    pub duration_seconds: f64,
    /// GeoJSON Feature or Geometry with a LineString track
    pub track: Option<serde_json::Value>,
    pub private: Option<bool>,
}

/// Manages the activity lifecycle.
#[derive(Clone)]
pub struct ActivityService {
    db: FirestoreDb,
}

impl ActivityService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Start a new open activity for a user.
    pub async fn start(&self, user_id: &str, activity_type: ActivityType) -> Result<Activity> {
        let activity = Activity {
            activity_id: new_document_id(),
            user_id: user_id.to_string(),
            activity_type,
            start_ts: chrono::Utc::now(),
            end_ts: None,
            distance_meters: 0.0,
            duration_seconds: 0.0,
            track_polyline: None,
            private: false,
        };

        self.db.set_activity(&activity).await?;

        tracing::info!(
            user_id,
            activity_id = %activity.activity_id,
            activity_type = %activity_type,
            "Activity started"
        );

        Ok(activity)
    }

    /// Finish an activity. Closes it exactly once; distance and duration
    /// become the immutable inputs to the mandatory anti-cheat gate.
    pub async fn finish(
        &self,
        user_id: &str,
        activity_id: &str,
        request: &FinishActivityRequest,
    ) -> Result<Activity> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut activity = self.get_owned_activity(user_id, activity_id).await?;

        if activity.is_closed() {
            return Err(AppError::BadRequest(
                "activity already finished".to_string(),
            ));
        }

        let track_polyline = request
            .track
            .as_ref()
            .map(|value| {
                let line = parse_track(value)?;
                polyline::encode_coordinates(line, TRACK_PRECISION)
                    .map_err(|e| AppError::BadRequest(format!("unencodable track: {}", e)))
            })
            .transpose()?;

        let end_ts = chrono::Utc::now();
        if end_ts <= activity.start_ts {
            return Err(AppError::BadRequest(
                "end timestamp must be after start timestamp".to_string(),
            ));
        }

        anticheat::validate_speed(
            activity.activity_type,
            request.distance_meters,
            request.duration_seconds,
        )?;

        activity.end_ts = Some(end_ts);
        activity.distance_meters = request.distance_meters;
        activity.duration_seconds = request.duration_seconds;
        activity.track_polyline = track_polyline;
        if let Some(private) = request.private {
            activity.private = private;
        }

        self.db.set_activity(&activity).await?;

        tracing::info!(
            user_id,
            activity_id,
            distance_meters = activity.distance_meters,
            duration_seconds = activity.duration_seconds,
            "Activity finished"
        );

        Ok(activity)
    }

    /// List a user's activities, newest first.
    pub async fn list(&self, user_id: &str, limit: u32, offset: u32) -> Result<Vec<Activity>> {
        self.db
            .get_activities_for_user(user_id, limit, offset)
            .await
    }

    /// Grid cells covered by an activity's recorded track.
    pub async fn track_cells(
        &self,
        user_id: &str,
        activity_id: &str,
        res: u8,
    ) -> Result<BTreeSet<String>> {
        let activity = self.get_owned_activity(user_id, activity_id).await?;

        let encoded = activity
            .track_polyline
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("activity has no recorded track".to_string()))?;

        let line = polyline::decode_polyline(encoded, TRACK_PRECISION)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored track is corrupt: {}", e)))?;

        Ok(grid::cells_for_track(&line, res)?)
    }

    async fn get_owned_activity(&self, user_id: &str, activity_id: &str) -> Result<Activity> {
        let activity = self
            .db
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("activity {} not found", activity_id)))?;

        if activity.user_id != user_id {
            return Err(AppError::Forbidden(
                "activity not owned by caller".to_string(),
            ));
        }

        Ok(activity)
    }
}

/// Parse a GeoJSON value into the track line string.
///
/// Accepts a Feature or bare Geometry carrying a LineString with at least
/// two points; everything else is an input-contract violation.
fn parse_track(value: &serde_json::Value) -> Result<LineString<f64>> {
    let geojson = GeoJson::from_json_value(value.clone())
        .map_err(|e| AppError::BadRequest(format!("invalid GeoJSON track: {}", e)))?;

    let geometry = match geojson {
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| AppError::BadRequest("track feature has no geometry".to_string()))?,
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::FeatureCollection(_) => {
            return Err(AppError::BadRequest(
                "track must be a single Feature or Geometry".to_string(),
            ))
        }
    };

    match geometry.value {
        line_value @ geojson::Value::LineString(_) => {
            let line: LineString<f64> = line_value.try_into().map_err(|e: geojson::Error| {
                AppError::BadRequest(format!("invalid track geometry: {}", e))
            })?;
            if line.0.len() < 2 {
                return Err(AppError::BadRequest(
                    "track must contain at least two points".to_string(),
                ));
            }
            Ok(line)
        }
        _ => Err(AppError::BadRequest(
            "track geometry must be a LineString".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_track_from_feature() {
        let value = json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[-122.42, 37.78], [-122.41, 37.79]]
            }
        });

        let line = parse_track(&value).unwrap();
        assert_eq!(line.0.len(), 2);
        assert_eq!(line.0[0].x, -122.42);
        assert_eq!(line.0[0].y, 37.78);
    }

    #[test]
    fn test_parse_track_from_bare_geometry() {
        let value = json!({
            "type": "LineString",
            "coordinates": [[-122.42, 37.78], [-122.41, 37.79], [-122.40, 37.80]]
        });

        let line = parse_track(&value).unwrap();
        assert_eq!(line.0.len(), 3);
    }

    #[test]
    fn test_parse_track_rejects_polygon() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        });
        assert!(parse_track(&value).is_err());
    }

    #[test]
    fn test_parse_track_rejects_single_point_line() {
        let value = json!({
            "type": "LineString",
            "coordinates": [[-122.42, 37.78]]
        });
        assert!(parse_track(&value).is_err());
    }

    #[test]
    fn test_parse_track_rejects_garbage() {
        assert!(parse_track(&json!({"type": "Banana"})).is_err());
        assert!(parse_track(&json!(42)).is_err());
    }

    #[test]
    fn test_track_polyline_round_trip() {
        let value = json!({
            "type": "LineString",
            "coordinates": [[-122.42, 37.78], [-122.41, 37.79]]
        });
        let line = parse_track(&value).unwrap();

        let encoded = polyline::encode_coordinates(line.clone(), TRACK_PRECISION).unwrap();
        let decoded = polyline::decode_polyline(&encoded, TRACK_PRECISION).unwrap();

        assert_eq!(decoded.0.len(), line.0.len());
        for (a, b) in decoded.0.iter().zip(line.0.iter()) {
            assert!((a.x - b.x).abs() < 1e-4);
            assert!((a.y - b.y).abs() < 1e-4);
        }
    }
}
