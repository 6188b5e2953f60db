//! Prometheus metrics for the gate
//!
//! # Metrics
//!
//! - `payment_gate_decisions_total{verdict}` - Gate decisions by verdict
//! - `payment_gate_rate_limited_total{class}` - Rate limit denials by endpoint class
//! - `payment_gate_validation_failures_total{reason}` - Rejected inputs by reason code
//! - `payment_gate_risk_score` - Histogram of risk scores

use crate::error::GateError;
use crate::models::Verdict;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Gate metrics
///
/// Each instance owns its registry, so several gates can live in one process.
#[derive(Clone)]
pub struct GateMetrics {
    /// Decisions by verdict
    pub decisions_total: IntCounterVec,

    /// Rate limit denials by endpoint class
    pub rate_limited_total: IntCounterVec,

    /// Validation failures by reason code
    pub validation_failures_total: IntCounterVec,

    /// Risk score histogram
    pub risk_score: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl GateMetrics {
    /// Create and register all gate metrics
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let decisions_total = IntCounterVec::new(
            Opts::new("payment_gate_decisions_total", "Gate decisions by verdict"),
            &["verdict"],
        )?;
        registry.register(Box::new(decisions_total.clone()))?;

        let rate_limited_total = IntCounterVec::new(
            Opts::new(
                "payment_gate_rate_limited_total",
                "Rate limit denials by endpoint class",
            ),
            &["class"],
        )?;
        registry.register(Box::new(rate_limited_total.clone()))?;

        let validation_failures_total = IntCounterVec::new(
            Opts::new(
                "payment_gate_validation_failures_total",
                "Rejected inputs by reason code",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        let risk_score = Histogram::with_opts(
            HistogramOpts::new("payment_gate_risk_score", "Histogram of risk scores")
                .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
        )?;
        registry.register(Box::new(risk_score.clone()))?;

        Ok(Self {
            decisions_total,
            rate_limited_total,
            validation_failures_total,
            risk_score,
            registry,
        })
    }

    /// Record a completed decision
    pub fn record_decision(&self, verdict: Verdict, score: f64) {
        self.decisions_total
            .with_label_values(&[verdict.as_str()])
            .inc();
        self.risk_score.observe(score);
    }

    /// Record a failed request
    pub fn record_error(&self, err: &GateError) {
        match err {
            GateError::RateLimited { class, .. } => {
                self.rate_limited_total
                    .with_label_values(&[class.as_str()])
                    .inc();
            }
            GateError::Validation(e) => {
                self.validation_failures_total
                    .with_label_values(&[e.code()])
                    .inc();
            }
            _ => {}
        }
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| GateError::Config(format!("metrics output: {}", e)))
    }
}

impl std::fmt::Debug for GateMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateMetrics").finish_non_exhaustive()
    }
}
