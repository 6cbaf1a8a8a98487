use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Resolver metrics
    pub resolutions: IntCounterVec,
    pub resolution_failures: IntCounterVec,

    // Token source metrics
    pub exchange_requests: IntCounterVec,
    pub exchange_duration: HistogramVec,

    // Registry metrics
    pub refreshes: IntCounterVec,
    pub held_credentials: IntGauge,

    // Store metrics
    pub store_writes: IntCounterVec,
    pub store_failures: IntCounterVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("credresolver".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Resolvers
            resolutions: IntCounterVec::new(Opts::new("resolutions_total", "Successful resolutions by source kind"),&["source_kind"],).unwrap(),
            resolution_failures: IntCounterVec::new(Opts::new("resolution_failures_total", "Failed resolutions by source kind and reason"),&["source_kind", "reason"],).unwrap(),

            // Token source
            exchange_requests: IntCounterVec::new(Opts::new("exchange_requests_total", "Token exchanges by kind and outcome"),&["kind", "outcome"],).unwrap(),
            exchange_duration: HistogramVec::new(HistogramOpts::new("exchange_duration_seconds", "Token exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["kind"],).unwrap(),

            // Registry
            refreshes: IntCounterVec::new(Opts::new("refreshes_total", "Refresh attempts by outcome"),&["outcome"],).unwrap(),
            held_credentials: IntGauge::new("held_credentials", "Credentials held in memory by the registry").unwrap(),

            // Store
            store_writes: IntCounterVec::new(Opts::new("store_writes_total", "Store writes by operation"),&["operation"],).unwrap(),
            store_failures: IntCounterVec::new(Opts::new("store_failures_total", "Store failures by operation"),&["operation"],).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.resolutions.clone())).unwrap();
        reg.register(Box::new(metrics.resolution_failures.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_requests.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.held_credentials.clone())).unwrap();
        reg.register(Box::new(metrics.store_writes.clone())).unwrap();
        reg.register(Box::new(metrics.store_failures.clone())).unwrap();

        metrics
    }

    /// Render all registered metrics in the text exposition format.
    pub fn gather_text(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %err, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
