use serde::Serialize;
use uuid::Uuid;

use crate::models::delivery::DeliveryStatus;

/// Fire-and-forget notifications consumed by dashboards. Never required
/// for correctness; a failed send must not affect the state change that
/// produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    DriverRegistered {
        driver_id: Uuid,
        admin_id: Uuid,
        summary: String,
    },
    RouteStarted {
        route_id: Uuid,
        driver_id: Uuid,
        summary: String,
    },
    DeliveryUpdated {
        delivery_id: Uuid,
        route_id: Option<Uuid>,
        status: DeliveryStatus,
        summary: String,
    },
    RouteCompleted {
        route_id: Uuid,
        driver_id: Uuid,
        summary: String,
    },
}
