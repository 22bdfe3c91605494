use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::external::optimizer::{PlanMaps, SolverResponse};
use crate::models::delivery::{CustomerDetails, DeliveryPoint, DeliveryStatus};
use crate::models::driver::DriverStatus;
use crate::models::route::{Route, RouteStatus, RouteStop, TravelMode};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    #[serde(flatten)]
    pub route: Route,
    pub driver: DriverSummary,
}

/// A created delivery point the solver left out of every route. Stays
/// pending for a future optimization pass.
#[derive(Debug, Clone, Serialize)]
pub struct UnassignedDelivery {
    pub id: Uuid,
    pub address: String,
    pub customer: CustomerDetails,
    pub weight: f64,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterializationSummary {
    pub total_deliveries: usize,
    pub assigned_deliveries: usize,
    pub unassigned_deliveries: usize,
    pub total_routes: usize,
}

#[derive(Debug, Serialize)]
pub struct MaterializedRoutes {
    pub routes: Vec<RouteView>,
    pub unassigned_deliveries: Vec<UnassignedDelivery>,
    pub summary: MaterializationSummary,
}

/// Converts the solver's numeric answer back into persisted Route
/// aggregates. Step order is load-bearing: optimized_seq is written in
/// exactly the order the solver returned, because that is the sequence
/// the driver will physically drive.
pub fn materialize_routes(
    state: &AppState,
    response: &SolverResponse,
    maps: &PlanMaps,
    created: &[DeliveryPoint],
    admin_id: Uuid,
) -> Result<MaterializedRoutes, AppError> {
    let by_id: HashMap<Uuid, &DeliveryPoint> = created.iter().map(|p| (p.id, p)).collect();

    // Resolve every vehicle id before touching the store. A response
    // referencing a vehicle outside the plan is malformed upstream
    // output and must leave nothing behind for the caller to unwind
    // beyond the staged points it already knows about.
    let mut drivers_by_route = Vec::with_capacity(response.routes.len());
    for solver_route in &response.routes {
        let driver_id = *maps.vehicles.get(&solver_route.vehicle).ok_or_else(|| {
            AppError::Upstream(format!(
                "solver returned unknown vehicle id {}",
                solver_route.vehicle
            ))
        })?;
        let driver = state
            .drivers
            .get(&driver_id)
            .map(|d| DriverSummary {
                id: d.id,
                name: d.name.clone(),
                phone: d.phone.clone(),
            })
            .ok_or_else(|| {
                AppError::Internal(format!("route planned for unknown driver {driver_id}"))
            })?;
        drivers_by_route.push((driver_id, driver));
    }

    let mut assigned_ids: HashSet<Uuid> = HashSet::new();
    let mut views = Vec::with_capacity(response.routes.len());

    for (solver_route, (driver_id, driver)) in response.routes.iter().zip(drivers_by_route) {
        let mut optimized_seq = Vec::new();
        let mut member_ids = Vec::new();

        for step in &solver_route.steps {
            if step.step_type != "job" {
                continue;
            }
            let Some(job_id) = step.job else {
                continue;
            };
            let Some(delivery_id) = maps.jobs.get(&job_id).copied() else {
                warn!(job_id, "solver step references a job outside the plan; skipping");
                continue;
            };
            let Some(point) = by_id.get(&delivery_id) else {
                continue;
            };

            optimized_seq.push(RouteStop {
                delivery_id,
                location_name: point.address.clone(),
                lat: point.lat,
                lng: point.lng,
            });
            member_ids.push(delivery_id);
            assigned_ids.insert(delivery_id);
        }

        let travel_mode = match solver_route.profile.as_deref() {
            Some("cycling-regular") => TravelMode::Cycling,
            _ => TravelMode::Driving,
        };

        let route = Route {
            id: Uuid::new_v4(),
            admin_id,
            driver_id,
            optimized_seq,
            delivery_points: member_ids.clone(),
            total_distance: solver_route.distance,
            total_time: solver_route.duration,
            travel_mode,
            status: RouteStatus::Assigned,
            created_at: Utc::now(),
        };
        state.routes.insert(route.id, route.clone());
        state.metrics.routes_active.inc();

        for delivery_id in &member_ids {
            if let Some(mut point) = state.deliveries.get_mut(delivery_id) {
                point.status = DeliveryStatus::Assigned;
            }
        }

        if let Some(mut record) = state.drivers.get_mut(&driver_id) {
            record.route_ids.push(route.id);
            record.status = DriverStatus::Busy;
        }

        info!(
            route_id = %route.id,
            driver_id = %driver_id,
            stops = route.optimized_seq.len(),
            "route persisted"
        );

        views.push(RouteView { route, driver });
    }

    let unassigned_deliveries: Vec<UnassignedDelivery> = created
        .iter()
        .filter(|point| !assigned_ids.contains(&point.id))
        .map(|point| UnassignedDelivery {
            id: point.id,
            address: point.address.clone(),
            customer: point.customer.clone(),
            weight: point.weight,
            lat: point.lat,
            lng: point.lng,
        })
        .collect();

    if !unassigned_deliveries.is_empty() {
        warn!(
            count = unassigned_deliveries.len(),
            "deliveries left unassigned by the solver; they stay pending"
        );
    }

    let summary = MaterializationSummary {
        total_deliveries: created.len(),
        assigned_deliveries: created.len() - unassigned_deliveries.len(),
        unassigned_deliveries: unassigned_deliveries.len(),
        total_routes: views.len(),
    };

    Ok(MaterializedRoutes {
        routes: views,
        unassigned_deliveries,
        summary,
    })
}
