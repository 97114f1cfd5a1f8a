// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard aggregation service.
//!
//! Read-only: streams the ownership table for one season scope, counts
//! tiles per user as typed records, and joins display metadata.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::TerritoryCell;
use std::collections::HashMap;

/// Leaderboard length cap.
pub const LEADERBOARD_SIZE: usize = 50;

/// Display fields for owners missing from the user table. Should not happen
/// given referential invariants, but a dangling owner id must not fail the
/// whole query.
const PLACEHOLDER_NAME: &str = "Unknown";
const PLACEHOLDER_COLOR: &str = "#999999";

/// Per-user tile count, before the display join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipCount {
    pub user_id: String,
    pub tiles_owned: u64,
}

/// One ranked leaderboard row.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub color: String,
    pub tiles_owned: u64,
}

/// Count owned tiles per user and rank descending, user id as tie-break.
///
/// The tie-break is identity-based: stable and deterministic, not
/// meaningful beyond that. Truncated to [`LEADERBOARD_SIZE`].
pub fn rank_owners(territories: &[TerritoryCell]) -> Vec<OwnershipCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for territory in territories {
        if let Some(owner) = territory.owner_user_id.as_deref() {
            *counts.entry(owner).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<OwnershipCount> = counts
        .into_iter()
        .map(|(user_id, tiles_owned)| OwnershipCount {
            user_id: user_id.to_string(),
            tiles_owned,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.tiles_owned
            .cmp(&a.tiles_owned)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    ranked.truncate(LEADERBOARD_SIZE);
    ranked
}

/// Computes ranked tile ownership for a season scope.
#[derive(Clone)]
pub struct LeaderboardService {
    db: FirestoreDb,
}

impl LeaderboardService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Top owners for a season (`None` = the season-less scope), with
    /// display metadata joined from the user table.
    pub async fn leaderboard(&self, season_id: Option<&str>) -> Result<Vec<LeaderboardEntry>> {
        let territories = self.db.get_territories_for_season(season_id).await?;
        let ranked = rank_owners(&territories);

        let mut entries = Vec::with_capacity(ranked.len());
        for count in ranked {
            let entry = match self.db.get_user(&count.user_id).await? {
                Some(user) => LeaderboardEntry {
                    user_id: count.user_id,
                    display_name: user.display_name,
                    color: user.color,
                    tiles_owned: count.tiles_owned,
                },
                None => {
                    tracing::warn!(
                        user_id = %count.user_id,
                        "Leaderboard owner missing from user table"
                    );
                    LeaderboardEntry {
                        user_id: count.user_id,
                        display_name: PLACEHOLDER_NAME.to_string(),
                        color: PLACEHOLDER_COLOR.to_string(),
                        tiles_owned: count.tiles_owned,
                    }
                }
            };
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Total tiles currently owned by one user, across all scopes.
    pub async fn tiles_owned(&self, user_id: &str) -> Result<u64> {
        self.db.count_territories_for_owner(user_id).await
    }
}
