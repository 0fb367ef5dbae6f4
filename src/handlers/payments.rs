use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::models::{BillingCycle, CreateTransaction, TransactionStatus, TransactionType};
use crate::tenancy;
use crate::util::MAX_BOOST_DURATION_DAYS;

use super::webhooks::effects::apply_success_effect;

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    /// Site prefix the paying profile lives under.
    pub site: String,
    pub profile_id: String,
    /// Tier granted on success, e.g. "pro" or "premium".
    pub tier: String,
    pub billing_cycle: BillingCycle,
    pub amount_kobo: i64,
}

#[derive(Debug, Deserialize)]
pub struct BoostRequest {
    pub site: String,
    pub property_id: String,
    /// How long the listing stays featured once the charge settles.
    pub duration_days: i64,
    pub amount_kobo: i64,
}

#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub reference: String,
    pub authorization_url: String,
    pub access_code: String,
}

/// Open a subscription checkout: write the pending ledger row, then ask
/// Paystack for an authorization URL to send the payer to.
pub async fn initiate_subscription(
    State(state): State<AppState>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<Json<InitiateResponse>> {
    if request.amount_kobo <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }
    if request.tier.trim().is_empty() {
        return Err(AppError::BadRequest("Tier is required".into()));
    }

    let pool = state
        .tenants
        .get(&request.site)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown site '{}'", request.site)))?;
    let conn = pool.get()?;

    let profile = queries::get_profile(&conn, &request.profile_id)?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    // The row must exist before the payer ever reaches Paystack, or the
    // charge events that follow have nothing to land on.
    let reference = tenancy::new_reference(&request.site);
    let transaction = queries::create_transaction(
        &conn,
        &CreateTransaction {
            reference: reference.clone(),
            profile_id: profile.id.clone(),
            transaction_type: TransactionType::Subscription,
            amount_kobo: request.amount_kobo,
            subscription_tier: Some(request.tier.clone()),
            billing_cycle: Some(request.billing_cycle),
            property_id: None,
            boost_duration_days: None,
        },
    )?;

    let callback_url = format!("{}/pay/callback", state.base_url);
    let init = state
        .gateway
        .initialize_transaction(&profile.email, request.amount_kobo, &reference, &callback_url)
        .await?;

    tracing::info!(
        "Opened subscription checkout: site={}, reference={}, tier={}, cycle={}",
        request.site,
        transaction.reference,
        request.tier,
        request.billing_cycle
    );

    Ok(Json(InitiateResponse {
        reference: transaction.reference,
        authorization_url: init.authorization_url,
        access_code: init.access_code,
    }))
}

/// Open a boost checkout for a property listing.
pub async fn initiate_boost(
    State(state): State<AppState>,
    Json(request): Json<BoostRequest>,
) -> Result<Json<InitiateResponse>> {
    if request.amount_kobo <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }
    if request.duration_days <= 0 {
        return Err(AppError::BadRequest("Duration must be positive".into()));
    }
    if request.duration_days > MAX_BOOST_DURATION_DAYS {
        return Err(AppError::BadRequest(
            "Duration cannot exceed 365 days".into(),
        ));
    }

    let pool = state
        .tenants
        .get(&request.site)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown site '{}'", request.site)))?;
    let conn = pool.get()?;

    let property = queries::get_property(&conn, &request.property_id)?
        .ok_or_else(|| AppError::NotFound("Property not found".into()))?;
    // The owner pays, so the checkout email comes off their profile.
    let profile = queries::get_profile(&conn, &property.profile_id)?
        .ok_or_else(|| AppError::NotFound("Property owner profile not found".into()))?;

    let reference = tenancy::new_reference(&request.site);
    let transaction = queries::create_transaction(
        &conn,
        &CreateTransaction {
            reference: reference.clone(),
            profile_id: profile.id.clone(),
            transaction_type: TransactionType::Boost,
            amount_kobo: request.amount_kobo,
            subscription_tier: None,
            billing_cycle: None,
            property_id: Some(property.id.clone()),
            boost_duration_days: Some(request.duration_days),
        },
    )?;

    let callback_url = format!("{}/pay/callback", state.base_url);
    let init = state
        .gateway
        .initialize_transaction(&profile.email, request.amount_kobo, &reference, &callback_url)
        .await?;

    tracing::info!(
        "Opened boost checkout: site={}, reference={}, property={}, duration_days={}",
        request.site,
        transaction.reference,
        property.id,
        request.duration_days
    );

    Ok(Json(InitiateResponse {
        reference: transaction.reference,
        authorization_url: init.authorization_url,
        access_code: init.access_code,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Appended by Paystack when it redirects the payer back.
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub reference: String,
    pub status: TransactionStatus,
}

/// Landing endpoint after Paystack checkout. Verifies the charge against
/// the gateway and settles it through the same conditional transitions the
/// webhook uses, so whichever path arrives first wins and the other is a
/// no-op.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>> {
    let (site, pool) = state.tenants.resolve_reference(&query.reference)?;
    let conn = pool.get()?;

    let transaction = queries::find_transaction_by_reference(&conn, &query.reference)?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    // Already settled by the webhook. Report the outcome as-is.
    if transaction.status != TransactionStatus::Pending {
        return Ok(Json(CallbackResponse {
            reference: transaction.reference,
            status: transaction.status,
        }));
    }

    let verification = state.gateway.verify_transaction(&query.reference).await?;
    let snapshot = serde_json::to_string(&verification)?;

    match verification.status.as_str() {
        "success" => {
            if queries::try_mark_transaction_success(&conn, &query.reference, &snapshot)? {
                apply_success_effect(&conn, &transaction)?;
                tracing::info!(
                    "Settled {} via callback: site={}, reference={}",
                    transaction.transaction_type,
                    site,
                    query.reference
                );
            }
        }
        "failed" => {
            queries::try_mark_transaction_failed(&conn, &query.reference, &snapshot)?;
        }
        "abandoned" => {
            queries::try_mark_transaction_abandoned(&conn, &query.reference, &snapshot)?;
        }
        other => {
            // "ongoing", "queued" and friends. Leave the row pending; the
            // webhook will settle it.
            tracing::debug!(
                "Verification for {} returned '{}', leaving pending",
                query.reference,
                other
            );
        }
    }

    let settled = queries::find_transaction_by_reference(&conn, &query.reference)?
        .ok_or_else(|| AppError::Internal("Transaction disappeared".into()))?;

    Ok(Json(CallbackResponse {
        reference: settled.reference,
        status: settled.status,
    }))
}
