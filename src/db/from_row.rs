//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse failures to
/// rusqlite errors instead of panicking when the database holds an invalid
/// value (corruption, hand-edited rows).
fn parse_enum<T>(
    row: &Row,
    col: usize,
    col_name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw = row.get::<_, String>(col)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const TRANSACTION_COLS: &str = "id, reference, profile_id, transaction_type, status, amount_kobo, subscription_tier, billing_cycle, property_id, boost_duration_days, gateway_response, verified_at, webhook_received_at, created_at, updated_at";

pub const PROFILE_COLS: &str = "id, email, full_name, phone, subscription_tier, subscription_expiry, is_verified, verification_status, created_at, updated_at";

pub const PROPERTY_COLS: &str = "id, profile_id, title, location, price_kobo, is_featured, featured_until, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for Transaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // billing_cycle only exists on subscription rows
        let billing_cycle = row
            .get::<_, Option<String>>(7)?
            .and_then(|s| BillingCycle::from_str(&s));
        Ok(Transaction {
            id: row.get(0)?,
            reference: row.get(1)?,
            profile_id: row.get(2)?,
            transaction_type: parse_enum(row, 3, "transaction_type", TransactionType::from_str)?,
            status: parse_enum(row, 4, "status", TransactionStatus::from_str)?,
            amount_kobo: row.get(5)?,
            subscription_tier: row.get(6)?,
            billing_cycle,
            property_id: row.get(8)?,
            boost_duration_days: row.get(9)?,
            gateway_response: row.get(10)?,
            verified_at: row.get(11)?,
            webhook_received_at: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            phone: row.get(3)?,
            subscription_tier: row.get(4)?,
            subscription_expiry: row.get(5)?,
            is_verified: row.get::<_, i32>(6)? != 0,
            verification_status: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for Property {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Property {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            title: row.get(2)?,
            location: row.get(3)?,
            price_kobo: row.get(4)?,
            is_featured: row.get::<_, i32>(5)? != 0,
            featured_until: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
