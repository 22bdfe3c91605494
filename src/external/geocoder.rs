use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::AppError;
use crate::models::GeoPoint;

/// Forward geocoding: address in, coordinates out. Fails with NotFound
/// when the provider has no result and Upstream when the provider
/// itself misbehaves.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    properties: Option<GeocodeProperties>,
    #[serde(default)]
    geometry: Option<GeocodeGeometry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeProperties {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    /// [lng, lat]
    #[serde(default)]
    coordinates: Vec<f64>,
}

/// Geoapify-style HTTP geocoder. Calls are serialized with a fixed
/// minimum spacing to respect the provider's rate limit.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl HttpGeocoder {
    pub fn new(base_url: String, api_key: Option<String>, min_interval: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client with static settings");

        Self {
            client,
            base_url,
            api_key,
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Internal("geocoder api key is not configured".to_string()))?;

        self.throttle().await;

        let url = format!(
            "{}?text={}&apiKey={}",
            self.base_url,
            urlencoding::encode(address),
            api_key
        );

        debug!(%address, "geocoding address");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| AppError::Upstream(format!("geocoding request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "geocoding provider returned {status}"
            )));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|err| AppError::Upstream(format!("unexpected geocoding response: {err}")))?;

        let feature = body
            .features
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("no geocoding result for address: {address}")))?;

        if let Some(props) = &feature.properties {
            if let (Some(lat), Some(lng)) = (props.lat, props.lon) {
                return Ok(GeoPoint { lat, lng });
            }
        }

        if let Some(geometry) = &feature.geometry {
            if let [lng, lat, ..] = geometry.coordinates[..] {
                return Ok(GeoPoint { lat, lng });
            }
        }

        Err(AppError::Upstream(
            "geocoding response carried no coordinates".to_string(),
        ))
    }
}
