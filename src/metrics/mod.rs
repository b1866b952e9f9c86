use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the customer service
// ============================================================================
//
// Covers:
// - Service operations (outcome, latency)
// - Optimistic-lock conflicts
// - Applied patch operations
// - Mail notifications and the mail circuit breaker
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub operations_total: IntCounterVec,
    pub operation_duration: HistogramVec,
    pub version_conflicts: IntCounter,
    pub patch_operations: IntCounterVec,
    pub mail_notifications: IntCounterVec,
    pub mail_circuit_breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("customer_operations_total", "Customer service operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "customer_operation_duration_seconds",
                "Customer service operation duration",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let version_conflicts = IntCounter::new(
            "customer_version_conflicts_total",
            "Updates rejected for a stale or invalid version token",
        )?;
        registry.register(Box::new(version_conflicts.clone()))?;

        let patch_operations = IntCounterVec::new(
            Opts::new("customer_patch_operations_total", "Patch operations received"),
            &["op"],
        )?;
        registry.register(Box::new(patch_operations.clone()))?;

        let mail_notifications = IntCounterVec::new(
            Opts::new("mail_notifications_total", "New-customer mail notifications by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(mail_notifications.clone()))?;

        let mail_circuit_breaker_state = IntGauge::new(
            "mail_circuit_breaker_state",
            "Mail circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(mail_circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operation_duration,
            version_conflicts,
            patch_operations,
            mail_notifications,
            mail_circuit_breaker_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.operations_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_version_conflict(&self) {
        self.version_conflicts.inc();
    }

    pub fn record_patch_operation(&self, op: &str) {
        self.patch_operations.with_label_values(&[op]).inc();
    }

    pub fn record_mail(&self, outcome: &str) {
        self.mail_notifications.with_label_values(&[outcome]).inc();
    }

    pub fn set_mail_circuit_state(&self, state: i64) {
        self.mail_circuit_breaker_state.set(state);
    }

    /// Registry contents in the Prometheus text exposition format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
