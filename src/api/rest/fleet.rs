use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::lifecycle::settle_driver_availability;
use crate::error::AppError;
use crate::events::DispatchEvent;
use crate::models::admin::Admin;
use crate::models::driver::{Driver, DriverStatus};
use crate::models::route::RouteStatus;
use crate::models::vehicle::{Vehicle, VehicleStatus, VehicleType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admins", post(create_admin))
        .route(
            "/admins/:id/drivers",
            post(register_driver).get(list_drivers),
        )
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/verify", patch(verify_driver))
        .route("/drivers/:id/status", patch(update_driver_status))
}

#[derive(Deserialize)]
pub struct CreateAdminRequest {
    pub name: String,
}

async fn create_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<Json<Admin>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let admin = Admin {
        id: Uuid::new_v4(),
        name: payload.name,
        driver_ids: vec![],
        created_at: Utc::now(),
    };

    state.admins.insert(admin.id, admin.clone());
    Ok(Json(admin))
}

#[derive(Deserialize)]
pub struct VehicleSpec {
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub capacity: f64,
}

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    pub phone: Option<String>,
    pub vehicle: VehicleSpec,
}

#[derive(Serialize)]
pub struct DriverWithVehicle {
    #[serde(flatten)]
    pub driver: Driver,
    pub vehicle: Vehicle,
}

/// Registers a driver together with their vehicle (1:1). New drivers
/// are unverified and excluded from eligibility until an admin verifies
/// them.
async fn register_driver(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<RegisterDriverRequest>,
) -> Result<Json<DriverWithVehicle>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if payload.vehicle.vehicle_number.trim().is_empty() {
        return Err(AppError::Validation(
            "vehicle_number cannot be empty".to_string(),
        ));
    }
    if !(payload.vehicle.capacity > 0.0) {
        return Err(AppError::Validation("capacity must be > 0".to_string()));
    }

    if !state.admins.contains_key(&admin_id) {
        return Err(AppError::NotFound(format!("admin {admin_id} not found")));
    }

    let duplicate = state
        .vehicles
        .iter()
        .any(|entry| entry.value().vehicle_number == payload.vehicle.vehicle_number);
    if duplicate {
        return Err(AppError::Conflict(format!(
            "vehicle number {} is already registered",
            payload.vehicle.vehicle_number
        )));
    }

    let driver_id = Uuid::new_v4();
    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        vehicle_number: payload.vehicle.vehicle_number,
        vehicle_type: payload.vehicle.vehicle_type,
        capacity: payload.vehicle.capacity,
        status: VehicleStatus::Free,
        assigned_to: Some(driver_id),
    };
    let driver = Driver {
        id: driver_id,
        name: payload.name,
        phone: payload.phone,
        vehicle_id: Some(vehicle.id),
        route_ids: vec![],
        status: DriverStatus::Free,
        verified: false,
    };

    state.vehicles.insert(vehicle.id, vehicle.clone());
    state.drivers.insert(driver.id, driver.clone());
    if let Some(mut admin) = state.admins.get_mut(&admin_id) {
        admin.driver_ids.push(driver.id);
    }

    state.publish(DispatchEvent::DriverRegistered {
        driver_id: driver.id,
        admin_id,
        summary: format!("driver {} registered, awaiting verification", driver.name),
    });

    Ok(Json(DriverWithVehicle { driver, vehicle }))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let driver_ids = state
        .admins
        .get(&admin_id)
        .map(|admin| admin.driver_ids.clone())
        .ok_or_else(|| AppError::NotFound(format!("admin {admin_id} not found")))?;

    let drivers = driver_ids
        .iter()
        .filter_map(|id| state.drivers.get(id).map(|d| d.clone()))
        .collect();

    Ok(Json(drivers))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .drivers
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    Ok(Json(driver.clone()))
}

async fn verify_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    driver.verified = true;
    Ok(Json(driver.clone()))
}

#[derive(Deserialize)]
pub struct UpdateDriverStatusRequest {
    pub status: DriverStatus,
}

/// Manual free/offline toggle. Busy is derived from route workload and
/// cannot be set by hand; a driver with active routes cannot be moved
/// out of it either.
async fn update_driver_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDriverStatusRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.status == DriverStatus::Busy {
        return Err(AppError::Validation(
            "busy is derived from route workload and cannot be set directly".to_string(),
        ));
    }

    let route_ids = state
        .drivers
        .get(&id)
        .map(|d| d.route_ids.clone())
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    let active = route_ids.iter().any(|route_id| {
        state
            .routes
            .get(route_id)
            .map(|r| matches!(r.status, RouteStatus::Assigned | RouteStatus::InProgress))
            .unwrap_or(false)
    });
    if active {
        return Err(AppError::Conflict(
            "driver has active routes and stays busy until they finish".to_string(),
        ));
    }

    {
        let mut driver = state
            .drivers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;
        driver.status = payload.status;
    }

    // Coming back from offline re-derives free/busy from workload.
    if payload.status == DriverStatus::Free {
        settle_driver_availability(&state, id);
    }

    let driver = state
        .drivers
        .get(&id)
        .map(|d| d.clone())
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    Ok(Json(driver))
}
