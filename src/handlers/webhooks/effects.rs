//! Domain effects of settled payments.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Transaction, TransactionType};
use crate::util::{boost_expiry, subscription_expiry};

/// Grant what a successful transaction paid for: activate the subscription
/// or feature the listing.
///
/// Only called after the caller has won the conditional flip to success, so
/// each transaction reaches this at most once. Both branches write absolute
/// values computed from the current time, never extensions of stored ones,
/// which keeps renewals from stacking.
pub fn apply_success_effect(conn: &Connection, transaction: &Transaction) -> Result<()> {
    let now = queries::now();
    match transaction.transaction_type {
        TransactionType::Subscription => {
            let tier = transaction.subscription_tier.as_deref().ok_or_else(|| {
                AppError::Internal(format!(
                    "subscription transaction {} has no tier",
                    transaction.reference
                ))
            })?;
            let cycle = transaction.billing_cycle.ok_or_else(|| {
                AppError::Internal(format!(
                    "subscription transaction {} has no billing cycle",
                    transaction.reference
                ))
            })?;
            let expiry = subscription_expiry(cycle, now);
            queries::apply_subscription_success(conn, &transaction.profile_id, tier, expiry)
        }
        TransactionType::Boost => {
            let property_id = transaction.property_id.as_deref().ok_or_else(|| {
                AppError::Internal(format!(
                    "boost transaction {} has no property",
                    transaction.reference
                ))
            })?;
            let duration_days = transaction.boost_duration_days.ok_or_else(|| {
                AppError::Internal(format!(
                    "boost transaction {} has no duration",
                    transaction.reference
                ))
            })?;
            let featured_until = boost_expiry(duration_days, now);
            queries::apply_boost_success(conn, property_id, featured_until)
        }
    }
}
