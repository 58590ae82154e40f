//! Prometheus metrics for the verification engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] that the metrics server
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

pub struct EngineMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Cycles that actually executed.
    pub cycles_run: IntCounter,
    /// Triggers dropped because a cycle was already running.
    pub cycles_skipped: IntCounter,
    pub wallets_checked: IntCounter,
    /// New verifications recorded, from either the scheduler or a command.
    pub verifications: IntCounter,
    pub chain_errors: IntCounter,
    pub store_write_failures: IntCounter,
    pub role_grant_failures: IntCounter,
    /// Failed direct messages and announcements.
    pub notification_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Pending wallets selected by the most recent cycle.
    pub pending_wallets: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    pub cycle_duration_seconds: Histogram,
}

impl EngineMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_run = register_int_counter_with_registry!(
            Opts::new("chaingate_cycles_run_total", "Scheduler cycles executed"),
            registry
        )?;

        let cycles_skipped = register_int_counter_with_registry!(
            Opts::new(
                "chaingate_cycles_skipped_total",
                "Scheduler triggers dropped while a cycle was running"
            ),
            registry
        )?;

        let wallets_checked = register_int_counter_with_registry!(
            Opts::new("chaingate_wallets_checked_total", "Pending wallets processed"),
            registry
        )?;

        let verifications = register_int_counter_with_registry!(
            Opts::new(
                "chaingate_verifications_total",
                "New verification records written"
            ),
            registry
        )?;

        let chain_errors = register_int_counter_with_registry!(
            Opts::new(
                "chaingate_chain_errors_total",
                "Chain queries that failed or timed out"
            ),
            registry
        )?;

        let store_write_failures = register_int_counter_with_registry!(
            Opts::new(
                "chaingate_store_write_failures_total",
                "Verification writes that failed; the wallet stays pending"
            ),
            registry
        )?;

        let role_grant_failures = register_int_counter_with_registry!(
            Opts::new(
                "chaingate_role_grant_failures_total",
                "Role grants rejected or unreachable after a recorded verification"
            ),
            registry
        )?;

        let notification_failures = register_int_counter_with_registry!(
            Opts::new(
                "chaingate_notification_failures_total",
                "Direct messages and announcements that failed"
            ),
            registry
        )?;

        let pending_wallets = register_int_gauge_with_registry!(
            Opts::new(
                "chaingate_pending_wallets",
                "Pending wallets selected by the last cycle"
            ),
            registry
        )?;

        // 10 ms → ~5.5 min
        let cycle_duration_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "chaingate_cycle_duration_seconds",
                "Wall time of one scheduler cycle"
            )
            .buckets(prometheus::exponential_buckets(0.01, 2.0, 16)?),
            registry
        )?;

        Ok(Self {
            registry,
            cycles_run,
            cycles_skipped,
            wallets_checked,
            verifications,
            chain_errors,
            store_write_failures,
            role_grant_failures,
            notification_failures,
            pending_wallets,
            cycle_duration_seconds,
        })
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
