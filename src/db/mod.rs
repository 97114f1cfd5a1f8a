//! Database layer (Firestore).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ACTIVITIES: &str = "activities";
    pub const SEASONS: &str = "seasons";
    /// Territory ownership records (keyed by cell + season scope)
    pub const TERRITORIES: &str = "territories";
    /// Append-only claim audit log
    pub const CLAIMS: &str = "claims";
}

/// Generate a random 128-bit document id (lowercase hex).
pub fn new_document_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Document ID for a territory record.
///
/// Encodes the `(cell, season)` uniqueness key so per-cell upserts on the
/// same key serialize on one document. Generated season ids are hex, so the
/// `global` suffix cannot collide.
pub fn territory_doc_id(cell: &str, season_id: Option<&str>) -> String {
    match season_id {
        Some(season) => format!("{}_{}", cell, urlencoding::encode(season)),
        None => format!("{}_global", cell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_id_shape() {
        let id = new_document_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_territory_doc_id_scopes_differ() {
        let global = territory_doc_id("8928308280fffff", None);
        let seasonal = territory_doc_id("8928308280fffff", Some("abc123"));
        assert_ne!(global, seasonal);
        assert_eq!(global, "8928308280fffff_global");
        assert_eq!(seasonal, "8928308280fffff_abc123");
    }
}
