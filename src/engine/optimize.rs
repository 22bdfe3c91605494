use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::eligibility::{eligible_drivers, EligibleDriver};
use crate::engine::materialize::{materialize_routes, MaterializedRoutes};
use crate::engine::selection::{effective_weight, select_drivers};
use crate::error::AppError;
use crate::external::optimizer::build_plan;
use crate::models::delivery::{CustomerDetails, DeliveryPoint, DeliveryStatus};
use crate::models::vehicle::VehicleStatus;
use crate::state::AppState;

/// One delivery demand as submitted by the admin.
#[derive(Debug, Clone)]
pub struct DeliveryDemand {
    pub address: String,
    pub name: String,
    pub phone: String,
    pub weight: Option<f64>,
}

/// The full pipeline: geocode, eligibility, selection, solver call,
/// materialization. Runs synchronously within one request.
///
/// Ordering is deliberate: nothing is persisted until eligibility and
/// selection have passed, so the only compensating action ever needed
/// is deleting the delivery points when the solver stage fails.
pub async fn run_optimization(
    state: &AppState,
    admin_id: Uuid,
    depot_address: &str,
    demands: &[DeliveryDemand],
) -> Result<MaterializedRoutes, AppError> {
    let depot = state.geocoder.geocode(depot_address).await?;

    // Geocode every demand before touching the store; a provider
    // failure here leaves nothing behind.
    let mut staged = Vec::with_capacity(demands.len());
    for demand in demands {
        let location = state.geocoder.geocode(&demand.address).await?;
        staged.push(DeliveryPoint {
            id: Uuid::new_v4(),
            address: demand.address.clone(),
            lat: location.lat,
            lng: location.lng,
            customer: CustomerDetails {
                name: demand.name.clone(),
                phone: demand.phone.clone(),
            },
            weight: effective_weight(demand.weight),
            status: DeliveryStatus::Pending,
            failure_reason: None,
            delivered_at: None,
            created_at: Utc::now(),
        });
    }

    let eligible = eligible_drivers(state, admin_id)?;
    if eligible.is_empty() {
        return Err(AppError::Validation(
            "no free drivers available for route optimization".to_string(),
        ));
    }

    let weights: Vec<f64> = staged.iter().map(|p| p.weight).collect();
    let selected = select_drivers(&eligible, &weights)?;
    info!(
        %admin_id,
        deliveries = staged.len(),
        drivers = selected.len(),
        "drivers selected for optimization"
    );

    for point in &staged {
        state.deliveries.insert(point.id, point.clone());
    }
    // Reserve the vehicles before handing off to the solver so a
    // concurrent batch cannot select them.
    set_vehicle_status(state, &selected, VehicleStatus::Busy);

    let (request, maps) = build_plan(&depot, &staged, &selected);

    let response = match state.solver.solve(&request).await.and_then(|response| {
        if !request.jobs.is_empty() && response.unassigned.len() == request.jobs.len() {
            Err(AppError::Capacity(
                "optimizer could not assign any jobs to the selected vehicles".to_string(),
            ))
        } else {
            Ok(response)
        }
    }) {
        Ok(response) => response,
        Err(err) => {
            rollback(state, &staged, &selected);
            warn!(
                %admin_id,
                count = staged.len(),
                "rolled back delivery points after optimizer failure"
            );
            return Err(err);
        }
    };

    if !response.unassigned.is_empty() {
        warn!(
            count = response.unassigned.len(),
            "solver left some jobs unassigned"
        );
    }

    let materialized = match materialize_routes(state, &response, &maps, &staged, admin_id) {
        Ok(materialized) => materialized,
        Err(err) => {
            // Materialization resolves the whole response before its
            // first write, so the staged points and reserved vehicles
            // are the only state to unwind.
            rollback(state, &staged, &selected);
            warn!(
                %admin_id,
                count = staged.len(),
                "rolled back delivery points after materialization failure"
            );
            return Err(err);
        }
    };

    // Selected drivers the solver gave no route to keep their vehicle.
    let routed: HashSet<Uuid> = materialized
        .routes
        .iter()
        .map(|view| view.route.driver_id)
        .collect();
    let idle: Vec<EligibleDriver> = selected
        .iter()
        .filter(|candidate| !routed.contains(&candidate.driver.id))
        .cloned()
        .collect();
    set_vehicle_status(state, &idle, VehicleStatus::Free);

    Ok(materialized)
}

fn rollback(state: &AppState, staged: &[DeliveryPoint], selected: &[EligibleDriver]) {
    for point in staged {
        state.deliveries.remove(&point.id);
    }
    set_vehicle_status(state, selected, VehicleStatus::Free);
}

fn set_vehicle_status(state: &AppState, candidates: &[EligibleDriver], status: VehicleStatus) {
    for candidate in candidates {
        if let Some(mut vehicle) = state.vehicles.get_mut(&candidate.vehicle.id) {
            vehicle.status = status;
        }
    }
}
