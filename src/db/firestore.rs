// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! The core issues exactly four query shapes against the store:
//! - keyed upserts over (cell, season) territory records, batched
//! - point/range lookups for territory records
//! - append-only writes for claim audit events
//! - existence/active-flag lookups for users, activities and seasons
//!
//! Three backends share the interface: the real Firestore client, an
//! in-memory store for tests, and an offline mock that errors on use.

use crate::db::{collections, territory_doc_id, MemoryStore};
use crate::error::AppError;
use crate::models::{Activity, ClaimEvent, Season, TerritoryCell, User};
use futures_util::{stream, StreamExt};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Live(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    Offline,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Live(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without
        // needing a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Live(client),
        })
    }

    /// Create an in-memory client for tests.
    ///
    /// Upserts and lookups behave like Firestore documents (last write per
    /// document wins); see [`MemoryStore`] for fault injection.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Access the in-memory store, if this client was built with one.
    pub fn memory_store(&self) -> Option<Arc<MemoryStore>> {
        match &self.backend {
            Backend::Memory(store) => Some(store.clone()),
            _ => None,
        }
    }

    /// Helper to get the live client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        match &self.backend {
            Backend::Live(client) => Ok(client),
            Backend::Memory(_) => Err(AppError::Database(
                "in-memory backend has no live client".to_string(),
            )),
            Backend::Offline => Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            )),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            return Ok(store.users.get(user_id).map(|u| u.value().clone()));
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        if let Backend::Memory(store) = &self.backend {
            store.users.insert(user.user_id.clone(), user.clone());
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Get an activity by id.
    pub async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            return Ok(store.activities.get(activity_id).map(|a| a.value().clone()));
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update an activity.
    pub async fn set_activity(&self, activity: &Activity) -> Result<(), AppError> {
        if let Backend::Memory(store) = &self.backend {
            store
                .activities
                .insert(activity.activity_id.clone(), activity.clone());
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.activity_id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get activities for a user, newest first, with pagination.
    pub async fn get_activities_for_user(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Activity>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            let mut activities: Vec<Activity> = store
                .activities
                .iter()
                .filter(|a| a.user_id == user_id)
                .map(|a| a.value().clone())
                .collect();
            activities.sort_by(|a, b| b.start_ts.cmp(&a.start_ts));
            return Ok(activities
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect());
        }

        let owner = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(owner.clone())]))
            .order_by([("start_ts", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Season Operations ───────────────────────────────────────

    /// Get a season by id.
    pub async fn get_season(&self, season_id: &str) -> Result<Option<Season>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            return Ok(store.seasons.get(season_id).map(|s| s.value().clone()));
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SEASONS)
            .obj()
            .one(season_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a season.
    pub async fn upsert_season(&self, season: &Season) -> Result<(), AppError> {
        if let Backend::Memory(store) = &self.backend {
            store.seasons.insert(season.season_id.clone(), season.clone());
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SEASONS)
            .document_id(&season.season_id)
            .object(season)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List seasons currently accepting claims.
    pub async fn get_active_seasons(&self) -> Result<Vec<Season>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            let mut seasons: Vec<Season> = store
                .seasons
                .iter()
                .filter(|s| s.is_active)
                .map(|s| s.value().clone())
                .collect();
            seasons.sort_by(|a, b| b.start_ts.cmp(&a.start_ts));
            return Ok(seasons);
        }

        self.get_client()?
            .fluent()
            .select()
            .from(collections::SEASONS)
            .filter(|q| q.for_all([q.field("is_active").eq(true)]))
            .order_by([("start_ts", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Territory Operations ────────────────────────────────────

    /// Upsert a batch of territory ownership records.
    ///
    /// Each record is an independent per-document write keyed by
    /// `(cell, season)`; there is no cross-record atomicity. Records are
    /// issued in fixed-size batches purely for throughput — batch
    /// boundaries carry no semantics. On error, records issued before the
    /// failure may already be durable.
    pub async fn upsert_territories(&self, records: &[TerritoryCell]) -> Result<(), AppError> {
        if let Backend::Memory(store) = &self.backend {
            for record in records {
                store.consume_territory_write()?;
                let doc_id = territory_doc_id(&record.cell, record.season_id.as_deref());
                store.territories.insert(doc_id, record.clone());
            }
            return Ok(());
        }

        let client = self.get_client()?;

        for chunk in records.chunks(BATCH_SIZE) {
            stream::iter(chunk.to_vec())
                .map(|record| async move {
                    let doc_id = territory_doc_id(&record.cell, record.season_id.as_deref());

                    let _: () = client
                        .fluent()
                        .update()
                        .in_col(collections::TERRITORIES)
                        .document_id(&doc_id)
                        .object(&record)
                        .execute()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    Ok::<_, AppError>(())
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .collect::<Vec<Result<(), AppError>>>()
                .await
                .into_iter()
                .collect::<Result<Vec<()>, AppError>>()?;
        }

        Ok(())
    }

    /// Point lookups for territory records by cell set, within one season
    /// scope. Cells with no record are simply absent from the result.
    pub async fn get_territories_by_cells(
        &self,
        cells: &[String],
        season_id: Option<&str>,
    ) -> Result<Vec<TerritoryCell>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            return Ok(cells
                .iter()
                .filter_map(|cell| store.territory(cell, season_id))
                .collect());
        }

        let client = self.get_client()?;
        let season = season_id.map(str::to_string);

        let found = stream::iter(cells.to_vec())
            .map(|cell| {
                let season = season.clone();
                async move {
                    let doc_id = territory_doc_id(&cell, season.as_deref());
                    client
                        .fluent()
                        .select()
                        .by_id_in(collections::TERRITORIES)
                        .obj::<TerritoryCell>()
                        .one(&doc_id)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<TerritoryCell>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<TerritoryCell>>, AppError>>()?;

        Ok(found.into_iter().flatten().collect())
    }

    /// All territory records in one season scope (`None` = the global,
    /// season-less scope). Used by the leaderboard aggregation.
    pub async fn get_territories_for_season(
        &self,
        season_id: Option<&str>,
    ) -> Result<Vec<TerritoryCell>, AppError> {
        if let Backend::Memory(store) = &self.backend {
            return Ok(store
                .territories
                .iter()
                .filter(|t| t.season_id.as_deref() == season_id)
                .map(|t| t.value().clone())
                .collect());
        }

        let client = self.get_client()?;
        let query = client.fluent().select().from(collections::TERRITORIES);

        let query = if let Some(season) = season_id {
            let season = season.to_string();
            query.filter(move |q| q.for_all([q.field("season_id").eq(season.clone())]))
        } else {
            query.filter(|q| q.for_all([q.field("season_id").is_null()]))
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count of cells currently owned by a user, across all scopes.
    pub async fn count_territories_for_owner(&self, user_id: &str) -> Result<u64, AppError> {
        if let Backend::Memory(store) = &self.backend {
            return Ok(store
                .territories
                .iter()
                .filter(|t| t.owner_user_id.as_deref() == Some(user_id))
                .count() as u64);
        }

        let owner = user_id.to_string();
        let records: Vec<TerritoryCell> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TERRITORIES)
            .filter(move |q| q.for_all([q.field("owner_user_id").eq(owner.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(records.len() as u64)
    }

    // ─── Claim Audit Operations ──────────────────────────────────

    /// Append a claim event to the audit log. Never updates in place.
    pub async fn append_claim_event(&self, event: &ClaimEvent) -> Result<(), AppError> {
        if let Backend::Memory(store) = &self.backend {
            store
                .claim_events
                .lock()
                .expect("claim event log poisoned")
                .push(event.clone());
            return Ok(());
        }

        let _: ClaimEvent = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CLAIMS)
            .generate_document_id()
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
