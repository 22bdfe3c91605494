pub mod geocoder;
pub mod optimizer;
