// Process-wide auth metrics
// Counters are registered on first reference and emission is best-effort:
// callers never branch on the result of a metric write.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

/// Label values for `auth_token_verifications_total{type=...}`
pub const VERIFY_TYPE_ACCESS: &str = "access";
pub const VERIFY_TYPE_REFRESH: &str = "refresh";
pub const VERIFY_TYPE_INTER_SERVICE: &str = "inter-service";

lazy_static! {
    pub static ref AUTH_REGISTRATIONS_TOTAL: IntCounter = register_int_counter!(
        "auth_registrations_total",
        "Number of successfully registered users"
    )
    .unwrap();
    pub static ref AUTH_REFRESHES_TOTAL: IntCounter = register_int_counter!(
        "auth_refreshes_total",
        "Number of successful session refreshes"
    )
    .unwrap();
    pub static ref AUTH_INTER_SERVICE_TOKENS_GENERATED_TOTAL: IntCounter = register_int_counter!(
        "auth_inter_service_tokens_generated_total",
        "Number of inter-service tokens issued"
    )
    .unwrap();
    pub static ref AUTH_TOKEN_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "auth_token_verifications_total",
        "Token verification attempts by token type and outcome",
        &["type", "status"]
    )
    .unwrap();
}

/// Record one verification attempt for the given token type
pub fn record_token_verification(token_type: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    AUTH_TOKEN_VERIFICATIONS_TOTAL
        .with_label_values(&[token_type, status])
        .inc();
}

/// Render the default registry in the Prometheus text exposition format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let before = AUTH_REGISTRATIONS_TOTAL.get();
        AUTH_REGISTRATIONS_TOTAL.inc();
        assert_eq!(AUTH_REGISTRATIONS_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_verification_labels() {
        let before = AUTH_TOKEN_VERIFICATIONS_TOTAL
            .with_label_values(&[VERIFY_TYPE_ACCESS, "failure"])
            .get();

        record_token_verification(VERIFY_TYPE_ACCESS, false);

        let after = AUTH_TOKEN_VERIFICATIONS_TOTAL
            .with_label_values(&[VERIFY_TYPE_ACCESS, "failure"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_gather_renders_text_format() {
        record_token_verification(VERIFY_TYPE_INTER_SERVICE, true);
        let rendered = gather();
        assert!(rendered.contains("auth_token_verifications_total"));
    }
}
