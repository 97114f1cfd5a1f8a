// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Territory ownership and claim audit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ownership record for one grid cell within one season scope.
///
/// At most one record exists per `(cell, season_id)` pair; the document ID
/// encodes the pair. A cell with `owner_user_id == None` (or no record at
/// all) is logically unclaimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritoryCell {
    /// Grid cell identifier (H3 index, lowercase hex)
    pub cell: String,
    /// Season scope; `None` means global/perpetual ownership
    pub season_id: Option<String>,
    /// Current owner; overwritten unconditionally by later claims
    pub owner_user_id: Option<String>,
    /// When the current owner claimed the cell
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Immutable audit record for one claim batch.
///
/// Appended only after every per-cell upsert in the batch was issued, so a
/// failed batch leaves no audit event even though some cells may already
/// have changed owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEvent {
    /// Claiming user
    pub user_id: String,
    /// Activity the claim was gated on
    pub activity_id: String,
    /// Season scope, if any
    pub season_id: Option<String>,
    /// Number of cells in the batch
    pub cell_count: u32,
    /// The full cell set
    pub cells: Vec<String>,
    /// When the batch was resolved
    pub claimed_at: DateTime<Utc>,
}
