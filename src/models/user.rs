//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default cosmetic color assigned at signup.
pub const DEFAULT_COLOR: &str = "#888888";

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable user id (also used as document ID)
    pub user_id: String,
    /// Name shown on the map and leaderboard
    pub display_name: String,
    /// Territory fill color (hex, e.g. "#FF0000")
    pub color: String,
    /// Whether the account is active
    pub is_active: bool,
    /// When the user signed up
    pub created_at: DateTime<Utc>,
}
