use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub geocoder_url: String,
    pub geocoder_api_key: Option<String>,
    pub geocoder_min_interval_ms: u64,
    pub optimizer_url: String,
    pub optimizer_api_key: Option<String>,
    pub optimizer_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://api.geoapify.com/v1/geocode/search".to_string()),
            geocoder_api_key: env::var("GEOCODER_API_KEY").ok(),
            geocoder_min_interval_ms: parse_or_default("GEOCODER_MIN_INTERVAL_MS", 250)?,
            optimizer_url: env::var("OPTIMIZER_URL")
                .unwrap_or_else(|_| "https://api.openrouteservice.org/optimization".to_string()),
            optimizer_api_key: env::var("OPTIMIZER_API_KEY").ok(),
            optimizer_timeout_secs: parse_or_default("OPTIMIZER_TIMEOUT_SECS", 30)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
