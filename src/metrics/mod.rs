//! Metrics module
//!
//! Prometheus counters for negotiation, signature checks and token minting.

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    pub static ref AUTH_NEGOTIATIONS: CounterVec = register_counter_vec!(
        "auth_negotiations_total",
        "Authentication method negotiations",
        &["kind", "status"]
    ).unwrap();

    pub static ref SIGNATURE_VERIFICATIONS: CounterVec = register_counter_vec!(
        "auth_signature_verifications_total",
        "Signed parameter verifications by result",
        &["result"]
    ).unwrap();

    pub static ref TOKENS_MINTED: Counter = register_counter!(
        "auth_tokens_minted_total",
        "Signed tokens minted"
    ).unwrap();
}

/// Record a negotiation outcome
pub fn record_negotiation(kind: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    AUTH_NEGOTIATIONS.with_label_values(&[kind, status]).inc();
}

/// Record a signature verification result
pub fn record_signature_verification(result: &str) {
    SIGNATURE_VERIFICATIONS.with_label_values(&[result]).inc();
}

/// Record a freshly minted token
pub fn record_token_minted() {
    TOKENS_MINTED.inc();
}
