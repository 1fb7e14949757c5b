//! Prometheus metrics for the registry.
//!
//! [`RegistryMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use verileaf_types::RegistryEvent;

use crate::error::RpcError;

pub struct RegistryMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Successful claim registrations, overwrites included.
    pub claims_registered: IntCounter,
    /// Successful score submissions.
    pub scores_submitted: IntCounter,
    /// Verifier updates, the one at construction included.
    pub verifier_updates: IntCounter,
    /// Write calls rejected, by error kind.
    pub rejected_calls: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Entries in the audit log.
    pub audit_log_length: IntGauge,
}

impl RegistryMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        // Registration only fails on duplicate or malformed names; all names
        // below are fixed and distinct.
        let claims_registered = register_int_counter_with_registry!(
            Opts::new(
                "verileaf_claims_registered_total",
                "Total successful claim registrations"
            ),
            registry
        )
        .expect("failed to register claims_registered counter");

        let scores_submitted = register_int_counter_with_registry!(
            Opts::new(
                "verileaf_scores_submitted_total",
                "Total impact scores submitted"
            ),
            registry
        )
        .expect("failed to register scores_submitted counter");

        let verifier_updates = register_int_counter_with_registry!(
            Opts::new(
                "verileaf_verifier_updates_total",
                "Total verifier role updates"
            ),
            registry
        )
        .expect("failed to register verifier_updates counter");

        let rejected_calls = register_int_counter_vec_with_registry!(
            Opts::new(
                "verileaf_rejected_calls_total",
                "Write calls rejected, by reason"
            ),
            &["kind"],
            registry
        )
        .expect("failed to register rejected_calls counter");

        let audit_log_length = register_int_gauge_with_registry!(
            Opts::new("verileaf_audit_log_length", "Entries in the audit log"),
            registry
        )
        .expect("failed to register audit_log_length gauge");

        Self {
            registry,
            claims_registered,
            scores_submitted,
            verifier_updates,
            rejected_calls,
            audit_log_length,
        }
    }

    /// Account for one registry notification.
    pub fn observe(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::VerifierUpdated { .. } => self.verifier_updates.inc(),
            RegistryEvent::ClaimRegistered { .. } => self.claims_registered.inc(),
            RegistryEvent::ScoreSubmitted { .. } => self.scores_submitted.inc(),
        }
        self.audit_log_length.inc();
    }

    pub fn record_rejection(&self, error: &RpcError) {
        self.rejected_calls.with_label_values(&[error.kind()]).inc();
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| RpcError::Server(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| RpcError::Server(e.to_string()))
    }
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self::new()
    }
}
