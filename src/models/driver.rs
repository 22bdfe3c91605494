use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Free,
    Busy,
    Offline,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DriverStatus::Free => "free",
            DriverStatus::Busy => "busy",
            DriverStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Busy is derived from route workload and never set by hand; free and
/// offline are the only manual states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub route_ids: Vec<Uuid>,
    pub status: DriverStatus,
    pub verified: bool,
}
