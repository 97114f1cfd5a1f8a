// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Territory claim resolution service.
//!
//! Turns a (user, activity, season?, cell-set) tuple into durable ownership
//! records plus one audit entry. All validation happens here, before any
//! persistence call — the storage layer carries no business rules.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{ClaimEvent, TerritoryCell};
use crate::services::{anticheat, grid};
use serde::Deserialize;
use validator::Validate;

/// A request to claim a set of cells against a finished activity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClaimRequest {
    /// Finished, validated activity the claim is gated on
    pub activity_id: String,
    /// Season scope; omit for global/perpetual ownership
    pub season_id: Option<String>,
    /// Cells to claim
    #[validate(length(min = 1, message = "cells must not be empty"))]
    pub cells: Vec<String>,
}

/// Acknowledgement returned on success. Callers get no per-cell detail;
/// the absence of an acknowledgement means the batch may be partially
/// applied (see [`ClaimService::claim_cells`]).
#[derive(Debug, Clone, Copy)]
pub struct ClaimReceipt {
    pub cells_claimed: usize,
}

/// Resolves ownership claims against the territory table.
#[derive(Clone)]
pub struct ClaimService {
    db: FirestoreDb,
}

impl ClaimService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Resolve a claim batch.
    ///
    /// Preconditions, each a distinct rejection:
    /// 1. the request is structurally valid (non-empty, well-formed cells) —
    ///    checked before any I/O;
    /// 2. the calling user exists;
    /// 3. the activity exists, belongs to the caller, is finished, and
    ///    passes the anti-cheat speed gate (re-checked here even though the
    ///    finish path already validated it);
    /// 4. a supplied season resolves to an existing, active season.
    ///
    /// Per-cell upserts are mutually independent: a failure partway leaves
    /// earlier cells durably claimed and no audit event. Callers must treat
    /// a failed claim as possibly partially applied. Concurrent claims on
    /// the same cell serialize at the store; the last committed write wins
    /// and no error is raised to the loser.
    pub async fn claim_cells(&self, user_id: &str, request: &ClaimRequest) -> Result<ClaimReceipt> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        for cell in &request.cells {
            grid::parse_cell(cell)?;
        }

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))?;

        let activity = self
            .db
            .get_activity(&request.activity_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("activity {} not found", request.activity_id))
            })?;

        if activity.user_id != user.user_id {
            return Err(AppError::Forbidden(
                "activity not owned by caller".to_string(),
            ));
        }
        if !activity.is_closed() {
            return Err(AppError::BadRequest(
                "activity must be finished before claiming".to_string(),
            ));
        }
        anticheat::validate_speed(
            activity.activity_type,
            activity.distance_meters,
            activity.duration_seconds,
        )?;

        if let Some(season_id) = &request.season_id {
            let season = self.db.get_season(season_id).await?;
            match season {
                Some(season) if season.is_active => {}
                _ => return Err(AppError::InvalidSeason(season_id.clone())),
            }
        }

        let claimed_at = chrono::Utc::now();
        let records: Vec<TerritoryCell> = request
            .cells
            .iter()
            .map(|cell| TerritoryCell {
                cell: cell.clone(),
                season_id: request.season_id.clone(),
                owner_user_id: Some(user.user_id.clone()),
                claimed_at: Some(claimed_at),
            })
            .collect();

        self.db.upsert_territories(&records).await?;

        // The audit event is written only after every upsert was issued; a
        // failure above leaves partial ownership changes with no event.
        let event = ClaimEvent {
            user_id: user.user_id.clone(),
            activity_id: request.activity_id.clone(),
            season_id: request.season_id.clone(),
            cell_count: request.cells.len() as u32,
            cells: request.cells.clone(),
            claimed_at,
        };
        self.db.append_claim_event(&event).await?;

        tracing::info!(
            user_id = %user.user_id,
            activity_id = %request.activity_id,
            season_id = ?request.season_id,
            cell_count = request.cells.len(),
            "Claim batch resolved"
        );

        Ok(ClaimReceipt {
            cells_claimed: request.cells.len(),
        })
    }
}
