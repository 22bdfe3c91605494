use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::lifecycle::{
    complete_route, start_route, update_delivery_status, DeliveryUpdate, DeliveryUpdateOutcome,
};
use crate::error::AppError;
use crate::models::delivery::{DeliveryPoint, DeliveryStatus};
use crate::models::route::Route;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/:id/routes", get(list_driver_routes))
        .route("/routes/:id", get(get_route))
        .route("/routes/:id/start", patch(start))
        .route("/routes/:id/complete", patch(complete))
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/status", patch(update_delivery))
}

#[derive(Serialize)]
pub struct RouteDetail {
    #[serde(flatten)]
    pub route: Route,
    pub deliveries: Vec<DeliveryPoint>,
}

async fn list_driver_routes(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<RouteDetail>>, AppError> {
    let route_ids = state
        .drivers
        .get(&driver_id)
        .map(|d| d.route_ids.clone())
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    let details = route_ids
        .iter()
        .filter_map(|id| state.routes.get(id).map(|r| r.clone()))
        .map(|route| {
            let deliveries = route
                .delivery_points
                .iter()
                .filter_map(|id| state.deliveries.get(id).map(|p| p.clone()))
                .collect();
            RouteDetail { route, deliveries }
        })
        .collect();

    Ok(Json(details))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = state
        .routes
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))?;

    Ok(Json(route.clone()))
}

async fn start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = start_route(&state, id)?;
    Ok(Json(route))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = complete_route(&state, id)?;
    Ok(Json(route))
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryPoint>, AppError> {
    let delivery = state
        .deliveries
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("delivery {id} not found")))?;

    Ok(Json(delivery.clone()))
}

#[derive(Deserialize)]
pub struct UpdateDeliveryRequest {
    pub status: DeliveryStatus,
    pub reason: Option<String>,
}

async fn update_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryRequest>,
) -> Result<Json<DeliveryUpdateOutcome>, AppError> {
    let outcome = update_delivery_status(
        &state,
        id,
        DeliveryUpdate {
            status: payload.status,
            reason: payload.reason,
        },
    )?;

    Ok(Json(outcome))
}
