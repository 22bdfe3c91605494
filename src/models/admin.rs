use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owns a set of drivers. Every optimization request runs against one
/// admin's fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub driver_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}
