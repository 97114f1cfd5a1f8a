// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivityType};
use crate::services::{grid, ClaimRequest, FinishActivityRequest};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Cap on the cell coverage of one viewport query (checked against the
/// indexer's upper-bound estimate). A finer resolution or a larger box is
/// rejected rather than issuing unbounded reads.
const MAX_VIEWPORT_CELLS: usize = 10_000;

const MAX_PER_PAGE: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/seasons", get(get_seasons))
        .route("/api/activities", post(start_activity).get(get_activities))
        .route("/api/activities/{id}/finish", post(finish_activity))
        .route("/api/activities/{id}/cells", get(get_activity_cells))
        .route("/api/claims", post(claim_territory))
        .route("/api/territories", get(get_viewport_territories))
        .route("/api/leaderboard", get(get_leaderboard))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub display_name: String,
    pub color: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub tiles_owned: u64,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state.db.get_user(&user.user_id).await?.ok_or_else(|| {
        crate::error::AppError::NotFound(format!("user {} not found", user.user_id))
    })?;

    let tiles_owned = state.leaderboard_service.tiles_owned(&user.user_id).await?;

    Ok(Json(UserResponse {
        user_id: profile.user_id,
        display_name: profile.display_name,
        color: profile.color,
        tiles_owned,
    }))
}

// ─── Seasons ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SeasonSummary {
    pub season_id: String,
    pub name: String,
    pub start_ts: String,
    pub end_ts: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SeasonsResponse {
    pub seasons: Vec<SeasonSummary>,
}

/// List seasons currently accepting claims.
async fn get_seasons(State(state): State<Arc<AppState>>) -> Result<Json<SeasonsResponse>> {
    let seasons = state
        .db
        .get_active_seasons()
        .await?
        .into_iter()
        .map(|s| SeasonSummary {
            season_id: s.season_id,
            name: s.name,
            start_ts: format_utc_rfc3339(s.start_ts),
            end_ts: format_utc_rfc3339(s.end_ts),
        })
        .collect();

    Ok(Json(SeasonsResponse { seasons }))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartActivityRequest {
    pub activity_type: ActivityType,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityResponse {
    pub activity_id: String,
    pub activity_type: String,
    pub start_ts: String,
    pub end_ts: Option<String>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub has_track: bool,
    pub private: bool,
}

fn to_activity_response(activity: Activity) -> ActivityResponse {
    ActivityResponse {
        activity_id: activity.activity_id,
        activity_type: activity.activity_type.to_string(),
        start_ts: format_utc_rfc3339(activity.start_ts),
        end_ts: activity.end_ts.map(format_utc_rfc3339),
        distance_meters: activity.distance_meters,
        duration_seconds: activity.duration_seconds,
        has_track: activity.track_polyline.is_some(),
        private: activity.private,
    }
}

/// Start a new activity.
async fn start_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StartActivityRequest>,
) -> Result<Json<ActivityResponse>> {
    let activity = state
        .activity_service
        .start(&user.user_id, request.activity_type)
        .await?;
    Ok(Json(to_activity_response(activity)))
}

/// Finish an activity (closes it exactly once, anti-cheat gated).
async fn finish_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
    Json(request): Json<FinishActivityRequest>,
) -> Result<Json<ActivityResponse>> {
    let activity = state
        .activity_service
        .finish(&user.user_id, &activity_id, &request)
        .await?;
    Ok(Json(to_activity_response(activity)))
}

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    limit: u32,
    /// Pagination: items to skip
    #[serde(default)]
    offset: u32,
}

fn default_per_page() -> u32 {
    50
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityResponse>,
    pub limit: u32,
    pub offset: u32,
}

/// Get user's activities, newest first.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    let limit = params.limit.min(MAX_PER_PAGE);

    tracing::debug!(
        user_id = %user.user_id,
        limit,
        offset = params.offset,
        "Fetching activities"
    );

    let activities = state
        .activity_service
        .list(&user.user_id, limit, params.offset)
        .await?
        .into_iter()
        .map(to_activity_response)
        .collect();

    Ok(Json(ActivitiesResponse {
        activities,
        limit,
        offset: params.offset,
    }))
}

#[derive(Deserialize)]
struct TrackCellsQuery {
    /// Grid resolution (0 = coarsest, 15 = finest)
    res: u8,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityCellsResponse {
    pub activity_id: String,
    pub res: u8,
    pub cells: Vec<String>,
}

/// Cells covered by an activity's recorded track, ready to claim.
async fn get_activity_cells(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
    Query(params): Query<TrackCellsQuery>,
) -> Result<Json<ActivityCellsResponse>> {
    let cells = state
        .activity_service
        .track_cells(&user.user_id, &activity_id, params.res)
        .await?;

    Ok(Json(ActivityCellsResponse {
        activity_id,
        res: params.res,
        cells: cells.into_iter().collect(),
    }))
}

// ─── Claims ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClaimResponse {
    pub cells_claimed: u32,
}

/// Claim a set of cells against a finished activity.
async fn claim_territory(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>> {
    let receipt = state
        .claim_service
        .claim_cells(&user.user_id, &request)
        .await?;

    Ok(Json(ClaimResponse {
        cells_claimed: receipt.cells_claimed as u32,
    }))
}

// ─── Territories (viewport) ──────────────────────────────────

#[derive(Deserialize)]
struct ViewportQuery {
    south: f64,
    north: f64,
    west: f64,
    east: f64,
    res: u8,
    season_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ViewportCell {
    pub cell: String,
    pub owner_user_id: Option<String>,
    pub claimed_at: Option<String>,
    pub season_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ViewportResponse {
    /// Claimed cells in the viewport; cells absent here are unclaimed
    pub cells: Vec<ViewportCell>,
    /// Total cell count of the viewport at the requested resolution
    pub total_cells: u32,
}

/// Territory ownership for a map viewport.
///
/// Thin read-only composition: the grid indexer enumerates the box, the
/// store is read fresh for ownership. Scoped to one season (or the global
/// scope when `season_id` is omitted).
async fn get_viewport_territories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ViewportQuery>,
) -> Result<Json<ViewportResponse>> {
    let bbox = grid::BoundingBox {
        south: params.south,
        north: params.north,
        west: params.west,
        east: params.east,
    };

    // Refuse oversized viewports before materializing any coverage.
    let estimate = grid::bbox_cell_estimate(&bbox, params.res)?;
    if estimate > MAX_VIEWPORT_CELLS {
        return Err(crate::error::AppError::BadRequest(format!(
            "viewport spans up to {} cells at this resolution (max {}); zoom in or lower the resolution",
            estimate, MAX_VIEWPORT_CELLS
        )));
    }

    let cells = grid::cells_for_bbox(&bbox, params.res)?;

    tracing::debug!(
        user_id = %user.user_id,
        cell_count = cells.len(),
        res = params.res,
        season_id = ?params.season_id,
        "Viewport territory query"
    );

    let cell_list: Vec<String> = cells.into_iter().collect();
    let records = state
        .db
        .get_territories_by_cells(&cell_list, params.season_id.as_deref())
        .await?;

    Ok(Json(ViewportResponse {
        total_cells: cell_list.len() as u32,
        cells: records
            .into_iter()
            .map(|r| ViewportCell {
                cell: r.cell,
                owner_user_id: r.owner_user_id,
                claimed_at: r.claimed_at.map(format_utc_rfc3339),
                season_id: r.season_id,
            })
            .collect(),
    }))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    season_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub display_name: String,
    pub color: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub tiles_owned: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardRow>,
}

/// Ranked tile ownership for a season (or the season-less scope).
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let entries = state
        .leaderboard_service
        .leaderboard(params.season_id.as_deref())
        .await?
        .into_iter()
        .map(|e| LeaderboardRow {
            user_id: e.user_id,
            display_name: e.display_name,
            color: e.color,
            tiles_owned: e.tiles_owned,
        })
        .collect();

    Ok(Json(LeaderboardResponse { entries }))
}
