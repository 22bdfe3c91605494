use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub optimizations_total: IntCounterVec,
    pub optimization_latency_seconds: HistogramVec,
    pub delivery_updates_total: IntCounterVec,
    pub routes_active: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let optimizations_total = IntCounterVec::new(
            Opts::new("optimizations_total", "Total optimization requests by outcome"),
            &["outcome"],
        )
        .expect("valid optimizations_total metric");

        let optimization_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "optimization_latency_seconds",
                "Latency of the full optimization pipeline in seconds",
            ),
            &["outcome"],
        )
        .expect("valid optimization_latency_seconds metric");

        let delivery_updates_total = IntCounterVec::new(
            Opts::new("delivery_updates_total", "Delivery status transitions by target status"),
            &["status"],
        )
        .expect("valid delivery_updates_total metric");

        let routes_active = IntGauge::new(
            "routes_active",
            "Routes currently assigned or in progress",
        )
        .expect("valid routes_active metric");

        registry
            .register(Box::new(optimizations_total.clone()))
            .expect("register optimizations_total");
        registry
            .register(Box::new(optimization_latency_seconds.clone()))
            .expect("register optimization_latency_seconds");
        registry
            .register(Box::new(delivery_updates_total.clone()))
            .expect("register delivery_updates_total");
        registry
            .register(Box::new(routes_active.clone()))
            .expect("register routes_active");

        Self {
            registry,
            optimizations_total,
            optimization_latency_seconds,
            delivery_updates_total,
            routes_active,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
