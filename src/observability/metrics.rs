use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub status_transitions_total: IntCounterVec,
    pub driver_assignments_total: IntCounterVec,
    pub stats_queries_seconds: HistogramVec,
    pub stats_cache_lookups_total: IntCounterVec,
    pub order_feed_clients: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Order status transitions by target status",
            ),
            &["to"],
        )
        .expect("valid status_transitions_total metric");

        let driver_assignments_total = IntCounterVec::new(
            Opts::new(
                "driver_assignments_total",
                "Driver assignment attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("valid driver_assignments_total metric");

        let stats_queries_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "stats_queries_seconds",
                "Latency of aggregation queries in seconds",
            ),
            &["endpoint"],
        )
        .expect("valid stats_queries_seconds metric");

        let stats_cache_lookups_total = IntCounterVec::new(
            Opts::new(
                "stats_cache_lookups_total",
                "Aggregation cache lookups by endpoint and result",
            ),
            &["endpoint", "result"],
        )
        .expect("valid stats_cache_lookups_total metric");

        let order_feed_clients =
            IntGauge::new("order_feed_clients", "Connected order feed websocket clients")
                .expect("valid order_feed_clients metric");

        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(driver_assignments_total.clone()))
            .expect("register driver_assignments_total");
        registry
            .register(Box::new(stats_queries_seconds.clone()))
            .expect("register stats_queries_seconds");
        registry
            .register(Box::new(stats_cache_lookups_total.clone()))
            .expect("register stats_cache_lookups_total");
        registry
            .register(Box::new(order_feed_clients.clone()))
            .expect("register order_feed_clients");

        Self {
            registry,
            status_transitions_total,
            driver_assignments_total,
            stats_queries_seconds,
            stats_cache_lookups_total,
            order_feed_clients,
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
