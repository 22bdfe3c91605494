use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::state::AppState;

/// A driver who can be handed a route right now, paired with the free
/// vehicle that makes them eligible.
#[derive(Debug, Clone)]
pub struct EligibleDriver {
    pub driver: Driver,
    pub vehicle: Vehicle,
}

/// Drivers of the given admin who are free, verified and hold a free
/// vehicle with a known positive capacity. An empty result is not an
/// error; callers decide whether that is fatal.
pub fn eligible_drivers(state: &AppState, admin_id: Uuid) -> Result<Vec<EligibleDriver>, AppError> {
    let driver_ids = state
        .admins
        .get(&admin_id)
        .map(|admin| admin.driver_ids.clone())
        .ok_or_else(|| AppError::NotFound(format!("admin {admin_id} not found")))?;

    let mut eligible = Vec::new();

    for driver_id in driver_ids {
        let Some(driver) = state.drivers.get(&driver_id) else {
            continue;
        };
        if driver.status != DriverStatus::Free || !driver.verified {
            continue;
        }
        let Some(vehicle_id) = driver.vehicle_id else {
            continue;
        };
        let Some(vehicle) = state.vehicles.get(&vehicle_id) else {
            continue;
        };
        if vehicle.status != VehicleStatus::Free || !(vehicle.capacity > 0.0) {
            continue;
        }

        eligible.push(EligibleDriver {
            driver: driver.clone(),
            vehicle: vehicle.clone(),
        });
    }

    Ok(eligible)
}
