use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Bike,
    Van,
    Tempo,
    Truck,
    #[serde(other)]
    Other,
}

impl VehicleType {
    /// Maximum number of delivery stops a vehicle of this type is
    /// assumed able to service in one route.
    pub fn stop_ceiling(&self) -> usize {
        match self {
            VehicleType::Bike => 15,
            VehicleType::Van => 25,
            VehicleType::Tempo => 35,
            VehicleType::Truck => 45,
            VehicleType::Other => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Free,
    Busy,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    /// Payload limit in weight units.
    pub capacity: f64,
    pub status: VehicleStatus,
    pub assigned_to: Option<Uuid>,
}
