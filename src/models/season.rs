// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Season model: a time-boxed competitive period scoping territory ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A season stored in Firestore.
///
/// Seasons are created by operators outside this service; the core only
/// looks them up to gate claims. Non-overlap between seasons is a
/// convention, not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    /// Season id (also used as document ID)
    pub season_id: String,
    /// Display name, e.g. "Winter 2026"
    pub name: String,
    /// Start of the competitive window
    pub start_ts: DateTime<Utc>,
    /// End of the competitive window (strictly after start)
    pub end_ts: DateTime<Utc>,
    /// Whether claims may currently reference this season
    pub is_active: bool,
}

impl Season {
    /// Check the time-window invariant.
    pub fn validate(&self) -> Result<(), SeasonError> {
        if self.end_ts <= self.start_ts {
            return Err(SeasonError::InvalidWindow);
        }
        Ok(())
    }
}

/// Errors from season validation.
#[derive(Debug, thiserror::Error)]
pub enum SeasonError {
    #[error("season end timestamp must be after start timestamp")]
    InvalidWindow,
}
