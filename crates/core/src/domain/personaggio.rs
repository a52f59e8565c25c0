use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A character ("personaggio") products can be associated with.
///
/// `position` is the display ordering slot; reordering moves are applied one
/// conditional update at a time and are explicitly non-transactional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personaggio {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
