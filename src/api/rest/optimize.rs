use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::engine::materialize::MaterializedRoutes;
use crate::engine::optimize::{run_optimization, DeliveryDemand};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/optimize", post(optimize))
}

#[derive(Deserialize)]
pub struct DepotSpec {
    pub address: String,
}

#[derive(Deserialize)]
pub struct DeliverySpec {
    pub address: String,
    pub name: String,
    pub phone: String,
    pub weight: Option<f64>,
}

#[derive(Deserialize)]
pub struct OptimizeRequest {
    pub admin_id: Uuid,
    pub depot: DepotSpec,
    pub deliveries: Vec<DeliverySpec>,
}

async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OptimizeRequest>,
) -> Result<Json<MaterializedRoutes>, AppError> {
    if payload.depot.address.trim().is_empty() {
        return Err(AppError::Validation(
            "depot address is required".to_string(),
        ));
    }
    if payload.deliveries.is_empty() {
        return Err(AppError::Validation(
            "at least one delivery is required".to_string(),
        ));
    }
    for (index, delivery) in payload.deliveries.iter().enumerate() {
        if delivery.address.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "delivery {index} is missing an address"
            )));
        }
    }

    let demands: Vec<DeliveryDemand> = payload
        .deliveries
        .iter()
        .map(|d| DeliveryDemand {
            address: d.address.clone(),
            name: d.name.clone(),
            phone: d.phone.clone(),
            weight: d.weight,
        })
        .collect();

    let started = Instant::now();
    let result = run_optimization(&state, payload.admin_id, &payload.depot.address, &demands).await;
    let elapsed = started.elapsed().as_secs_f64();

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .optimization_latency_seconds
        .with_label_values(&[outcome])
        .observe(elapsed);
    state
        .metrics
        .optimizations_total
        .with_label_values(&[outcome])
        .inc();

    match result {
        Ok(materialized) => Ok(Json(materialized)),
        Err(err) => {
            error!(error = %err, admin_id = %payload.admin_id, "optimization failed");
            Err(err)
        }
    }
}
