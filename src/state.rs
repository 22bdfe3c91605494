use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::events::DispatchEvent;
use crate::external::geocoder::Geocoder;
use crate::external::optimizer::RouteSolver;
use crate::models::admin::Admin;
use crate::models::delivery::DeliveryPoint;
use crate::models::driver::Driver;
use crate::models::route::Route;
use crate::models::vehicle::Vehicle;
use crate::observability::metrics::Metrics;

/// Document-style store: one map per collection, each mutation an
/// independent fetch-mutate-store with no cross-map transactions.
pub struct AppState {
    pub admins: DashMap<Uuid, Admin>,
    pub drivers: DashMap<Uuid, Driver>,
    pub vehicles: DashMap<Uuid, Vehicle>,
    pub deliveries: DashMap<Uuid, DeliveryPoint>,
    pub routes: DashMap<Uuid, Route>,
    pub geocoder: Arc<dyn Geocoder>,
    pub solver: Arc<dyn RouteSolver>,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        event_buffer_size: usize,
        geocoder: Arc<dyn Geocoder>,
        solver: Arc<dyn RouteSolver>,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            admins: DashMap::new(),
            drivers: DashMap::new(),
            vehicles: DashMap::new(),
            deliveries: DashMap::new(),
            routes: DashMap::new(),
            geocoder,
            solver,
            events_tx,
            metrics: Metrics::new(),
        }
    }

    /// Fire-and-forget broadcast; dropped when nobody is subscribed.
    pub fn publish(&self, event: DispatchEvent) {
        let _ = self.events_tx.send(event);
    }
}
