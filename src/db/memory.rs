// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store backing [`FirestoreDb`](crate::db::FirestoreDb) for tests.
//!
//! Mirrors the semantics the core relies on from Firestore: per-document
//! atomic upserts with last-write-wins, plus an append-only claim log.
//! Territory writes can be made to fail after a budget of successes so the
//! partial-batch failure mode is testable.

use crate::db::territory_doc_id;
use crate::error::AppError;
use crate::models::{Activity, ClaimEvent, Season, TerritoryCell, User};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// In-memory document store.
pub struct MemoryStore {
    pub(crate) users: DashMap<String, User>,
    pub(crate) activities: DashMap<String, Activity>,
    pub(crate) seasons: DashMap<String, Season>,
    pub(crate) territories: DashMap<String, TerritoryCell>,
    pub(crate) claim_events: Mutex<Vec<ClaimEvent>>,
    /// Remaining successful territory writes; negative means unlimited.
    territory_write_budget: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            activities: DashMap::new(),
            seasons: DashMap::new(),
            territories: DashMap::new(),
            claim_events: Mutex::new(Vec::new()),
            territory_write_budget: AtomicI64::new(-1),
        }
    }

    /// Fault injection: let the next `n` territory upserts succeed, then
    /// fail every subsequent one with a database error.
    pub fn fail_territory_upserts_after(&self, n: i64) {
        self.territory_write_budget.store(n, Ordering::SeqCst);
    }

    /// Consume one unit of the territory write budget.
    pub(crate) fn consume_territory_write(&self) -> Result<(), AppError> {
        loop {
            let current = self.territory_write_budget.load(Ordering::SeqCst);
            if current < 0 {
                return Ok(());
            }
            if current == 0 {
                return Err(AppError::Database(
                    "injected territory write failure".to_string(),
                ));
            }
            if self
                .territory_write_budget
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    /// Current ownership record for a cell, if one exists.
    pub fn territory(&self, cell: &str, season_id: Option<&str>) -> Option<TerritoryCell> {
        self.territories
            .get(&territory_doc_id(cell, season_id))
            .map(|r| r.value().clone())
    }

    /// Number of territory records across all scopes.
    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }

    /// Snapshot of the claim audit log.
    pub fn claim_events(&self) -> Vec<ClaimEvent> {
        self.claim_events
            .lock()
            .expect("claim event log poisoned")
            .clone()
    }
}
