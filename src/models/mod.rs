pub mod admin;
pub mod delivery;
pub mod driver;
pub mod route;
pub mod vehicle;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}
