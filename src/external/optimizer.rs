use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engine::eligibility::EligibleDriver;
use crate::error::AppError;
use crate::models::delivery::DeliveryPoint;
use crate::models::vehicle::VehicleType;
use crate::models::GeoPoint;

/// Per-stop service duration handed to the solver, in seconds.
const SERVICE_TIME_SECS: u32 = 300;

/// One unit of delivery demand in the solver's schema. The solver only
/// accepts small integer ids; `PlanMaps` translates back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverJob {
    pub id: u32,
    /// [lng, lat]
    pub location: [f64; 2],
    pub service: u32,
    pub amount: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverVehicle {
    pub id: u32,
    /// [lng, lat]
    pub start: [f64; 2],
    pub capacity: Vec<f64>,
    pub profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverRequest {
    pub jobs: Vec<SolverJob>,
    pub vehicles: Vec<SolverVehicle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverStep {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub job: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverRoute {
    pub vehicle: u32,
    pub steps: Vec<SolverStep>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignedJob {
    pub id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverResponse {
    #[serde(default)]
    pub routes: Vec<SolverRoute>,
    #[serde(default)]
    pub unassigned: Vec<UnassignedJob>,
}

/// Bidirectional numeric↔identity lookup built immediately before the
/// external call and consulted immediately after. Lives for one request.
#[derive(Debug, Clone, Default)]
pub struct PlanMaps {
    pub jobs: HashMap<u32, Uuid>,
    pub vehicles: HashMap<u32, Uuid>,
}

/// Translates domain entities into the solver's numeric job/vehicle
/// schema and records the id maps needed to translate the answer back.
pub fn build_plan(
    depot: &GeoPoint,
    points: &[DeliveryPoint],
    selected: &[EligibleDriver],
) -> (SolverRequest, PlanMaps) {
    let mut maps = PlanMaps::default();

    let jobs = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let job_id = index as u32 + 1;
            maps.jobs.insert(job_id, point.id);
            SolverJob {
                id: job_id,
                location: [point.lng, point.lat],
                service: SERVICE_TIME_SECS,
                amount: vec![point.weight],
            }
        })
        .collect();

    let vehicles = selected
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let vehicle_id = index as u32 + 1;
            maps.vehicles.insert(vehicle_id, candidate.driver.id);
            SolverVehicle {
                id: vehicle_id,
                start: [depot.lng, depot.lat],
                capacity: vec![candidate.vehicle.capacity],
                profile: travel_profile(candidate.vehicle.vehicle_type).to_string(),
            }
        })
        .collect();

    (SolverRequest { jobs, vehicles }, maps)
}

pub fn travel_profile(vehicle_type: VehicleType) -> &'static str {
    match vehicle_type {
        VehicleType::Bike => "cycling-regular",
        _ => "driving-car",
    }
}

/// The external vehicle-routing engine: jobs and vehicles in, sequenced
/// routes plus unassigned jobs out.
#[async_trait]
pub trait RouteSolver: Send + Sync {
    async fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, AppError>;
}

/// OpenRouteService-style HTTP solver with a hard request timeout,
/// after which the call fails fast as a retryable upstream error.
pub struct HttpRouteSolver {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRouteSolver {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static settings");

        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl RouteSolver for HttpRouteSolver {
    async fn solve(&self, request: &SolverRequest) -> Result<SolverResponse, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Internal("optimizer api key is not configured".to_string()))?;

        debug!(
            jobs = request.jobs.len(),
            vehicles = request.vehicles.len(),
            "invoking route optimizer"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| AppError::Upstream(format!("optimizer request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "optimizer returned {status}: {body}"
            )));
        }

        response
            .json::<SolverResponse>()
            .await
            .map_err(|err| AppError::Upstream(format!("unexpected optimizer response: {err}")))
    }
}
