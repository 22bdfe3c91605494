use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::DispatchEvent;
use crate::models::delivery::{DeliveryPoint, DeliveryStatus};
use crate::models::driver::DriverStatus;
use crate::models::route::{Route, RouteStatus};
use crate::models::vehicle::VehicleStatus;
use crate::state::AppState;

const NO_REASON: &str = "No reason provided";

/// Moves a route from assigned to in-progress and flips its assigned
/// member deliveries to in-progress in bulk. Any other starting status
/// is a conflict naming that status.
pub fn start_route(state: &AppState, route_id: Uuid) -> Result<Route, AppError> {
    let (driver_id, members) = {
        let mut route = state
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| AppError::NotFound(format!("route {route_id} not found")))?;

        if route.status != RouteStatus::Assigned {
            return Err(AppError::Conflict(format!(
                "cannot start route in status {}",
                route.status
            )));
        }

        route.status = RouteStatus::InProgress;
        (route.driver_id, route.delivery_points.clone())
    };

    for delivery_id in &members {
        if let Some(mut point) = state.deliveries.get_mut(delivery_id) {
            if point.status == DeliveryStatus::Assigned {
                point.status = DeliveryStatus::InProgress;
            }
        }
    }

    let route = state
        .routes
        .get(&route_id)
        .map(|r| r.clone())
        .ok_or_else(|| AppError::Internal(format!("route {route_id} vanished mid-update")))?;

    info!(%route_id, %driver_id, stops = members.len(), "route started");
    state.publish(DispatchEvent::RouteStarted {
        route_id,
        driver_id,
        summary: format!("route {route_id} started with {} stops", members.len()),
    });

    Ok(route)
}

#[derive(Debug, Clone)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryUpdateOutcome {
    pub delivery: DeliveryPoint,
    /// Owning route after the cascade, when the delivery belongs to one.
    pub route: Option<Route>,
}

/// Applies a driver-reported delivery transition, then restores the
/// derived invariants upward: route completion when every member is
/// terminal, driver availability when no active routes remain.
pub fn update_delivery_status(
    state: &AppState,
    delivery_id: Uuid,
    update: DeliveryUpdate,
) -> Result<DeliveryUpdateOutcome, AppError> {
    match update.status {
        DeliveryStatus::InProgress
        | DeliveryStatus::Delivered
        | DeliveryStatus::Failed
        | DeliveryStatus::Cancelled => {}
        other => {
            return Err(AppError::Validation(format!(
                "unsupported target status {other}"
            )));
        }
    }

    let delivery = {
        let mut point = state
            .deliveries
            .get_mut(&delivery_id)
            .ok_or_else(|| AppError::NotFound(format!("delivery {delivery_id} not found")))?;

        if point.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "delivery is already {}",
                point.status
            )));
        }

        match update.status {
            DeliveryStatus::Delivered => {
                point.status = DeliveryStatus::Delivered;
                point.delivered_at = Some(chrono::Utc::now());
                point.failure_reason = None;
            }
            DeliveryStatus::Failed | DeliveryStatus::Cancelled => {
                point.status = update.status;
                point.failure_reason =
                    Some(update.reason.clone().unwrap_or_else(|| NO_REASON.to_string()));
            }
            DeliveryStatus::InProgress => {
                point.status = DeliveryStatus::InProgress;
            }
            _ => unreachable!("target status validated above"),
        }

        point.clone()
    };

    state
        .metrics
        .delivery_updates_total
        .with_label_values(&[delivery.status.as_str()])
        .inc();

    let owning_route_id = find_owning_route(state, delivery_id);
    let mut route_after = None;

    if let Some(route_id) = owning_route_id {
        if delivery.status.is_terminal() {
            if let Some(driver_id) = settle_route_if_done(state, route_id) {
                state.metrics.routes_active.dec();
                info!(%route_id, %driver_id, "route auto-completed");
                state.publish(DispatchEvent::RouteCompleted {
                    route_id,
                    driver_id,
                    summary: format!("route {route_id} completed"),
                });
                settle_driver_availability(state, driver_id);
            }
        }
        route_after = state.routes.get(&route_id).map(|r| r.clone());
    }

    state.publish(DispatchEvent::DeliveryUpdated {
        delivery_id,
        route_id: owning_route_id,
        status: delivery.status,
        summary: format!("delivery {delivery_id} marked {}", delivery.status),
    });

    Ok(DeliveryUpdateOutcome {
        delivery,
        route: route_after,
    })
}

/// Explicit driver action. Refused while any member delivery is still
/// open; the conflict enumerates the blocking deliveries.
pub fn complete_route(state: &AppState, route_id: Uuid) -> Result<Route, AppError> {
    let (driver_id, members, status) = {
        let route = state
            .routes
            .get(&route_id)
            .ok_or_else(|| AppError::NotFound(format!("route {route_id} not found")))?;
        (route.driver_id, route.delivery_points.clone(), route.status)
    };

    if status == RouteStatus::Completed {
        return Err(AppError::Conflict("route is already completed".to_string()));
    }

    let open: Vec<Uuid> = members
        .iter()
        .filter(|id| {
            state
                .deliveries
                .get(id)
                .map(|p| !p.status.is_terminal())
                .unwrap_or(false)
        })
        .copied()
        .collect();

    if !open.is_empty() {
        let ids = open
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::Conflict(format!(
            "cannot complete route: {} deliveries still open: {ids}",
            open.len()
        )));
    }

    {
        let mut route = state
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| AppError::Internal(format!("route {route_id} vanished mid-update")))?;
        route.status = RouteStatus::Completed;
    }
    state.metrics.routes_active.dec();

    info!(%route_id, %driver_id, "route completed by driver");
    state.publish(DispatchEvent::RouteCompleted {
        route_id,
        driver_id,
        summary: format!("route {route_id} completed"),
    });
    settle_driver_availability(state, driver_id);

    state
        .routes
        .get(&route_id)
        .map(|r| r.clone())
        .ok_or_else(|| AppError::Internal(format!("route {route_id} vanished mid-update")))
}

fn find_owning_route(state: &AppState, delivery_id: Uuid) -> Option<Uuid> {
    state
        .routes
        .iter()
        .find(|entry| entry.value().delivery_points.contains(&delivery_id))
        .map(|entry| *entry.key())
}

/// Invariant restorer: flips the route to completed exactly once when
/// every member delivery is terminal. Safe to call repeatedly; concurrent
/// repeats settle on the same answer. Returns the driver to re-derive
/// when the flip happened here.
fn settle_route_if_done(state: &AppState, route_id: Uuid) -> Option<Uuid> {
    let (driver_id, members, status) = {
        let route = state.routes.get(&route_id)?;
        (route.driver_id, route.delivery_points.clone(), route.status)
    };

    if status == RouteStatus::Completed {
        return None;
    }

    let all_terminal = members.iter().all(|id| {
        state
            .deliveries
            .get(id)
            .map(|p| p.status.is_terminal())
            // A missing member cannot block completion.
            .unwrap_or(true)
    });

    if !all_terminal {
        return None;
    }

    let mut route = state.routes.get_mut(&route_id)?;
    if route.status == RouteStatus::Completed {
        return None;
    }
    route.status = RouteStatus::Completed;

    Some(driver_id)
}

/// Invariant restorer: driver status is a projection of route workload.
/// Busy while any route is assigned or in-progress, free otherwise; a
/// freed driver's busy vehicle is released with them. Offline drivers
/// are left alone.
pub fn settle_driver_availability(state: &AppState, driver_id: Uuid) {
    let Some((route_ids, status, vehicle_id)) = state
        .drivers
        .get(&driver_id)
        .map(|d| (d.route_ids.clone(), d.status, d.vehicle_id))
    else {
        return;
    };

    if status == DriverStatus::Offline {
        return;
    }

    let active = route_ids.iter().any(|id| {
        state
            .routes
            .get(id)
            .map(|r| matches!(r.status, RouteStatus::Assigned | RouteStatus::InProgress))
            .unwrap_or(false)
    });

    let next = if active {
        DriverStatus::Busy
    } else {
        DriverStatus::Free
    };

    if next != status {
        if let Some(mut driver) = state.drivers.get_mut(&driver_id) {
            driver.status = next;
        }
        info!(%driver_id, status = %next, "driver availability re-derived");
    }

    if next == DriverStatus::Free {
        if let Some(vehicle_id) = vehicle_id {
            if let Some(mut vehicle) = state.vehicles.get_mut(&vehicle_id) {
                if vehicle.status == VehicleStatus::Busy {
                    vehicle.status = VehicleStatus::Free;
                }
            }
        }
    }
}
