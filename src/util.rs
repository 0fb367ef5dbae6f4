//! Shared helpers for the plotpay service.

use axum::http::HeaderMap;

use crate::models::BillingCycle;

pub const SECONDS_PER_DAY: i64 = 86400;

/// Days granted by a subscription payment, per billing cycle. Annual is a
/// flat 365 days rather than a calendar-aware year.
pub const MONTHLY_SUBSCRIPTION_DAYS: i64 = 30;
pub const ANNUAL_SUBSCRIPTION_DAYS: i64 = 365;

/// Longest boost a listing can buy in one transaction. Enforced at
/// initiation, so every duration reaching the expiry math sits inside it.
pub const MAX_BOOST_DURATION_DAYS: i64 = 365;

/// New subscription expiry for a payment reconciled at `base_time`.
///
/// Always computed from `base_time` (the reconciliation instant), never from
/// the profile's previous expiry: renewals do not stack.
pub fn subscription_expiry(cycle: BillingCycle, base_time: i64) -> i64 {
    let days = match cycle {
        BillingCycle::Monthly => MONTHLY_SUBSCRIPTION_DAYS,
        BillingCycle::Annual => ANNUAL_SUBSCRIPTION_DAYS,
    };
    base_time + days * SECONDS_PER_DAY
}

/// End of a listing's featured window for a boost reconciled at `base_time`.
pub fn boost_expiry(duration_days: i64, base_time: i64) -> i64 {
    base_time + duration_days * SECONDS_PER_DAY
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
