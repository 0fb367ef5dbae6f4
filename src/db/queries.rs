//! Database operations for tenant sites.
//!
//! Every function takes a `&Connection` checked out of the owning tenant's
//! pool. The ledger's status transitions are written as single conditional
//! UPDATEs decided by affected-row count, so concurrent webhook deliveries
//! race on the database row and exactly one wins.

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::from_row::{query_all, query_one, PROFILE_COLS, PROPERTY_COLS, TRANSACTION_COLS};
use crate::error::{AppError, Result};
use crate::models::*;

/// Get current Unix timestamp.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Generate a new UUID string for use as a primary key.
pub fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Profiles ============

pub fn create_profile(conn: &Connection, req: &CreateProfile) -> Result<Profile> {
    let id = gen_id();
    let ts = now();
    conn.execute(
        "INSERT INTO profiles (id, email, full_name, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, req.email, req.full_name, req.phone, ts, ts],
    )?;
    get_profile(conn, &id)?.ok_or_else(|| AppError::Internal("Failed to create profile".into()))
}

pub fn get_profile(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLS),
        &[&id],
    )
}

/// Used by the seeder to tell an empty site from one with data.
pub fn count_profiles(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
    Ok(count)
}

/// Apply the domain effect of a successful subscription payment: new tier,
/// new expiry, and the verification flags every paid subscriber gets.
///
/// A single absolute UPDATE so a retried application converges instead of
/// compounding. Missing profile → NotFound, which the webhook handler
/// surfaces as a retryable processing error.
pub fn apply_subscription_success(
    conn: &Connection,
    profile_id: &str,
    tier: &str,
    expiry: i64,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE profiles
         SET subscription_tier = ?2, subscription_expiry = ?3,
             is_verified = 1, verification_status = 'verified', updated_at = ?4
         WHERE id = ?1",
        params![profile_id, tier, expiry, now()],
    )?;
    if affected == 0 {
        return Err(AppError::NotFound(format!("Profile {} not found", profile_id)));
    }
    Ok(())
}

// ============ Properties ============

pub fn create_property(conn: &Connection, req: &CreateProperty) -> Result<Property> {
    let id = gen_id();
    let ts = now();
    conn.execute(
        "INSERT INTO properties (id, profile_id, title, location, price_kobo, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, req.profile_id, req.title, req.location, req.price_kobo, ts, ts],
    )?;
    get_property(conn, &id)?.ok_or_else(|| AppError::Internal("Failed to create property".into()))
}

pub fn get_property(conn: &Connection, id: &str) -> Result<Option<Property>> {
    query_one(
        conn,
        &format!("SELECT {} FROM properties WHERE id = ?1", PROPERTY_COLS),
        &[&id],
    )
}

/// Apply the domain effect of a successful boost payment: feature the
/// listing until the computed date. Absolute set, same convergence rules as
/// [`apply_subscription_success`].
pub fn apply_boost_success(conn: &Connection, property_id: &str, featured_until: i64) -> Result<()> {
    let affected = conn.execute(
        "UPDATE properties
         SET is_featured = 1, featured_until = ?2, updated_at = ?3
         WHERE id = ?1",
        params![property_id, featured_until, now()],
    )?;
    if affected == 0 {
        return Err(AppError::NotFound(format!("Property {} not found", property_id)));
    }
    Ok(())
}

// ============ Transactions (payment ledger) ============

pub fn create_transaction(conn: &Connection, req: &CreateTransaction) -> Result<Transaction> {
    let id = gen_id();
    let ts = now();
    conn.execute(
        "INSERT INTO transactions (id, reference, profile_id, transaction_type, status, amount_kobo,
                                   subscription_tier, billing_cycle, property_id, boost_duration_days,
                                   created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            req.reference,
            req.profile_id,
            req.transaction_type.as_str(),
            req.amount_kobo,
            req.subscription_tier,
            req.billing_cycle.map(|c| c.as_str()),
            req.property_id,
            req.boost_duration_days,
            ts,
            ts
        ],
    )?;
    find_transaction_by_reference(conn, &req.reference)?
        .ok_or_else(|| AppError::Internal("Failed to create transaction".into()))
}

pub fn find_transaction_by_reference(
    conn: &Connection,
    reference: &str,
) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE reference = ?1", TRANSACTION_COLS),
        &[&reference],
    )
}

/// Reconcile a transaction as paid. The `status != 'success'` guard makes
/// this the single-writer gate for the whole success path: of N concurrent
/// deliveries of the same event, exactly one sees a row affected and goes on
/// to apply the domain effect.
///
/// Returns true if this call performed the transition.
pub fn try_mark_transaction_success(
    conn: &Connection,
    reference: &str,
    gateway_response: &str,
) -> Result<bool> {
    let ts = now();
    let affected = conn.execute(
        "UPDATE transactions
         SET status = 'success', verified_at = ?2, webhook_received_at = ?2,
             gateway_response = ?3, updated_at = ?2
         WHERE reference = ?1 AND status != 'success'",
        params![reference, ts, gateway_response],
    )?;
    Ok(affected > 0)
}

/// Record a failed charge. Guarded to pending rows only so a late failure
/// event can never downgrade a reconciled payment.
///
/// Returns true if this call performed the transition.
pub fn try_mark_transaction_failed(
    conn: &Connection,
    reference: &str,
    gateway_response: &str,
) -> Result<bool> {
    let ts = now();
    let affected = conn.execute(
        "UPDATE transactions
         SET status = 'failed', webhook_received_at = ?2, gateway_response = ?3, updated_at = ?2
         WHERE reference = ?1 AND status = 'pending'",
        params![reference, ts, gateway_response],
    )?;
    Ok(affected > 0)
}

/// Record a timed-out charge as abandoned. Same pending-only guard as
/// [`try_mark_transaction_failed`].
///
/// Returns true if this call performed the transition.
pub fn try_mark_transaction_abandoned(
    conn: &Connection,
    reference: &str,
    gateway_response: &str,
) -> Result<bool> {
    let ts = now();
    let affected = conn.execute(
        "UPDATE transactions
         SET status = 'abandoned', webhook_received_at = ?2, gateway_response = ?3, updated_at = ?2
         WHERE reference = ?1 AND status = 'pending'",
        params![reference, ts, gateway_response],
    )?;
    Ok(affected > 0)
}

/// List a tenant's ledger, newest first, with the total row count for
/// pagination.
pub fn list_transactions(
    conn: &Connection,
    filters: &TransactionFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Transaction>, i64)> {
    let build_filter_params = || {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(v) = filters.status {
            params.push(Box::new(v.as_str()));
        }
        if let Some(v) = filters.transaction_type {
            params.push(Box::new(v.as_str()));
        }
        if let Some(ref v) = filters.profile_id {
            params.push(Box::new(v.clone()));
        }
        params
    };

    let mut where_clause = String::from("WHERE 1=1");
    if filters.status.is_some() {
        where_clause.push_str(" AND status = ?");
    }
    if filters.transaction_type.is_some() {
        where_clause.push_str(" AND transaction_type = ?");
    }
    if filters.profile_id.is_some() {
        where_clause.push_str(" AND profile_id = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM transactions {}", where_clause);
    let filter_params = build_filter_params();
    let filter_refs: Vec<&dyn rusqlite::ToSql> = filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, filter_refs.as_slice(), |row| row.get(0))?;

    let select_sql = format!(
        "SELECT {} FROM transactions {} ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
        TRANSACTION_COLS, where_clause
    );
    let mut select_params = build_filter_params();
    select_params.push(Box::new(limit));
    select_params.push(Box::new(offset));
    let select_refs: Vec<&dyn rusqlite::ToSql> = select_params.iter().map(|b| b.as_ref()).collect();

    let transactions = query_all(conn, &select_sql, select_refs.as_slice())?;
    Ok((transactions, total))
}
