//! Core metrics: upscales, gate denials, debits and referrals.

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric name constants.
pub mod names {
    /// Upscales by outcome (`success`, `failed`, `denied`).
    pub const UPSCALES_TOTAL: &str = "pxs_upscales_total";

    /// Time spent in the upscale service.
    pub const UPSCALE_DURATION_SECONDS: &str = "pxs_upscale_duration_seconds";

    /// Entitlement and credit gate refusals by reason.
    pub const ENTITLEMENT_DENIALS_TOTAL: &str = "pxs_entitlement_denials_total";

    /// Credits debited by actor kind.
    pub const CREDIT_DEBITS_TOTAL: &str = "pxs_credit_debits_total";

    /// Debits that failed after a successful upscale.
    pub const CREDIT_LEAKS_TOTAL: &str = "pxs_credit_leaks_total";

    /// Referral submissions by outcome.
    pub const REFERRALS_TOTAL: &str = "pxs_referrals_total";
}

pub fn record_upscale(outcome: &'static str, duration: Option<Duration>) {
    counter!(names::UPSCALES_TOTAL, "outcome" => outcome).increment(1);
    if let Some(duration) = duration {
        histogram!(names::UPSCALE_DURATION_SECONDS).record(duration.as_secs_f64());
    }
}

pub fn record_denial(reason: &'static str) {
    counter!(names::ENTITLEMENT_DENIALS_TOTAL, "reason" => reason).increment(1);
}

pub fn record_debit(actor: &'static str) {
    counter!(names::CREDIT_DEBITS_TOTAL, "actor" => actor).increment(1);
}

pub fn record_leak(actor: &'static str) {
    counter!(names::CREDIT_LEAKS_TOTAL, "actor" => actor).increment(1);
}

pub fn record_referral(outcome: &'static str) {
    counter!(names::REFERRALS_TOTAL, "outcome" => outcome).increment(1);
}
