//! Prometheus counters for launcher invocations.
//!
//! # Metrics
//!
//! - `spark_exec_total{preset, status}` - finished submissions, `status` is
//!   `success` or `failure`
//! - `retry_total{preset}` - every launcher invocation made by a submission,
//!   including the first one
//!
//! Counters live in a [`Registry`] owned by the [`Metrics`] instance rather than
//! a process-wide default registry, so tests can build isolated instances.

use std::fmt;

use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};

/// Final outcome of one submission's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success,
    Failure,
}

impl SubmitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitOutcome::Success => "success",
            SubmitOutcome::Failure => "failure",
        }
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counting collaborator injected into the gateway.
pub trait SubmitRecorder: Send + Sync {
    /// Called before every launcher invocation of a submission.
    fn record_attempt(&self, preset: &str);

    /// Called exactly once when a submission's retry loop ends.
    fn record_outcome(&self, preset: &str, outcome: SubmitOutcome);
}

/// Recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl SubmitRecorder for NoopRecorder {
    fn record_attempt(&self, _preset: &str) {}

    fn record_outcome(&self, _preset: &str, _outcome: SubmitOutcome) {}
}

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    exec_total: IntCounterVec,
    retry_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let exec_total = IntCounterVec::new(
            Opts::new("spark_exec_total", "The total number of spark-submit runs"),
            &["preset", "status"],
        )?;
        let retry_total = IntCounterVec::new(
            Opts::new("retry_total", "The total number of retries"),
            &["preset"],
        )?;

        registry.register(Box::new(exec_total.clone()))?;
        registry.register(Box::new(retry_total.clone()))?;

        Ok(Self {
            registry,
            exec_total,
            retry_total,
        })
    }

    pub fn exec_count(&self, preset: &str, outcome: SubmitOutcome) -> u64 {
        self.exec_total
            .with_label_values(&[preset, outcome.as_str()])
            .get()
    }

    pub fn attempt_count(&self, preset: &str) -> u64 {
        self.retry_total.with_label_values(&[preset]).get()
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn gather(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl SubmitRecorder for Metrics {
    fn record_attempt(&self, preset: &str) {
        self.retry_total.with_label_values(&[preset]).inc();
    }

    fn record_outcome(&self, preset: &str, outcome: SubmitOutcome) {
        self.exec_total
            .with_label_values(&[preset, outcome.as_str()])
            .inc();
    }
}
