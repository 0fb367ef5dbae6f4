//! Operator endpoints for inspecting the reconciliation ledger across sites.

use axum::{
    Router, middleware,
    extract::State,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::require_ops_token;
use crate::models::{Transaction, TransactionFilters, TransactionStatus, TransactionType};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/ops/sites", get(list_sites))
        .route("/ops/transactions/{reference}", get(get_transaction))
        .route("/ops/{site}/transactions", get(list_site_transactions))
        .layer(middleware::from_fn_with_state(state, require_ops_token))
}

/// GET /ops/sites
/// The site prefixes this instance routes for.
async fn list_sites(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.tenants.prefixes())
}

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by reconciliation status
    pub status: Option<TransactionStatus>,
    /// Filter by transaction type (subscription, boost)
    pub transaction_type: Option<TransactionType>,
    /// Filter by paying profile
    pub profile_id: Option<String>,
    /// Max results to return (default 50, max 100)
    pub limit: Option<i64>,
    /// Offset for pagination (default 0)
    pub offset: Option<i64>,
}

impl ListTransactionsQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    fn to_filters(&self) -> TransactionFilters {
        TransactionFilters {
            status: self.status,
            transaction_type: self.transaction_type,
            profile_id: self.profile_id.clone(),
        }
    }
}

/// Paginated page of a site's ledger.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Deserialize)]
pub struct SitePath {
    pub site: String,
}

/// GET /ops/{site}/transactions
/// List one site's transactions with filters and pagination.
async fn list_site_transactions(
    State(state): State<AppState>,
    Path(path): Path<SitePath>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionPage>> {
    let pool = state
        .tenants
        .get(&path.site)
        .ok_or_else(|| AppError::NotFound(format!("Unknown site '{}'", path.site)))?;
    let conn = pool.get()?;

    let limit = query.limit();
    let offset = query.offset();
    let (items, total) = queries::list_transactions(&conn, &query.to_filters(), limit, offset)?;

    Ok(Json(TransactionPage {
        items,
        total,
        limit,
        offset,
    }))
}

#[derive(Deserialize)]
pub struct ReferencePath {
    pub reference: String,
}

/// GET /ops/transactions/{reference}
/// Look a reference up in whichever site it routes to.
async fn get_transaction(
    State(state): State<AppState>,
    Path(path): Path<ReferencePath>,
) -> Result<Json<Transaction>> {
    let (_site, pool) = state.tenants.resolve_reference(&path.reference)?;
    let conn = pool.get()?;

    let transaction = queries::find_transaction_by_reference(&conn, &path.reference)?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    Ok(Json(transaction))
}
