use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStatus {
    Assigned,
    InProgress,
    Completed,
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RouteStatus::Assigned => "assigned",
            RouteStatus::InProgress => "in-progress",
            RouteStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Cycling,
}

/// One stop in the solver-determined visiting order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub delivery_id: Uuid,
    pub location_name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub driver_id: Uuid,
    /// Solver-determined order; immutable after creation, this is the
    /// real-world drive sequence.
    pub optimized_seq: Vec<RouteStop>,
    pub delivery_points: Vec<Uuid>,
    pub total_distance: f64,
    pub total_time: f64,
    pub travel_mode: TravelMode,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
}
