//! Prometheus Metrics Registry - Engine Observability
//!
//! Registers the engine's counters and histograms. The host service
//! owns the HTTP surface; `render()` returns the text exposition format
//! for whatever `/metrics` endpoint it serves.

use anyhow::{Context, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Centralized Prometheus metrics for the pricing engine.
///
/// All metrics follow the naming convention `lmsr_engine_*`.
pub struct EngineMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Quotes served, by side.
    pub quotes: IntCounterVec,
    /// Commit attempts, by outcome (`committed` or a rejection reason).
    pub commits: IntCounterVec,
    /// Commit latency in microseconds, lock wait included.
    pub commit_latency_us: HistogramVec,
    /// Estimates that carried a slippage warning.
    pub slippage_warnings: IntCounter,
    /// Mirror/authority divergences, by field.
    pub precision_drift: IntCounterVec,
    /// Reconciliations that found a non-zero gap.
    pub reconciliation_gaps: IntCounter,
}

impl EngineMetrics {
    /// Create and register all metrics on a fresh registry.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let quotes = IntCounterVec::new(
            Opts::new("lmsr_engine_quotes_total", "Quotes served"),
            &["side"],
        )?;

        let commits = IntCounterVec::new(
            Opts::new("lmsr_engine_commits_total", "Commit attempts by outcome"),
            &["outcome"],
        )?;

        let commit_latency_us = HistogramVec::new(
            HistogramOpts::new(
                "lmsr_engine_commit_latency_us",
                "Commit latency in microseconds, including lock wait",
            )
            .buckets(vec![
                50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0, 250_000.0,
            ]),
            &["side"],
        )?;

        let slippage_warnings = IntCounter::new(
            "lmsr_engine_slippage_warnings_total",
            "Estimates whose price impact exceeded the warning threshold",
        )?;

        let precision_drift = IntCounterVec::new(
            Opts::new(
                "lmsr_engine_precision_drift_total",
                "Client mirror estimates diverging from the authoritative result",
            ),
            &["field"],
        )?;

        let reconciliation_gaps = IntCounter::new(
            "lmsr_engine_reconciliation_gaps_total",
            "Reconciliations where net invested differed from debits",
        )?;

        registry.register(Box::new(quotes.clone()))?;
        registry.register(Box::new(commits.clone()))?;
        registry.register(Box::new(commit_latency_us.clone()))?;
        registry.register(Box::new(slippage_warnings.clone()))?;
        registry.register(Box::new(precision_drift.clone()))?;
        registry.register(Box::new(reconciliation_gaps.clone()))?;

        Ok(Self {
            registry,
            quotes,
            commits,
            commit_latency_us,
            slippage_warnings,
            precision_drift,
            reconciliation_gaps,
        })
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output was not UTF-8")
    }
}
