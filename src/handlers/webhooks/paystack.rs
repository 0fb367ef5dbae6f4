//! Paystack webhook processing.
//!
//! One endpoint receives charge events for every site in the network. The
//! order of operations is fixed: verify the signature over the raw body,
//! parse the envelope, acknowledge events that do not drive the ledger,
//! route the reference to its tenant database, then apply the event as a
//! conditional status transition. The status code we answer with drives
//! Paystack's redelivery, so transient problems get a 5xx and final
//! outcomes get a 2xx.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use rusqlite::Connection;

use crate::db::{AppState, queries};
use crate::models::TransactionStatus;
use crate::payments::{PaystackWebhookEvent, SIGNATURE_HEADER};

use super::effects::apply_success_effect;

/// Result type for webhook operations.
pub type WebhookResult = (StatusCode, &'static str);

/// The charge outcomes that move the ledger. Everything else Paystack
/// delivers is acknowledged without action.
enum ChargeEvent {
    Success,
    Failed,
    Timeout,
}

/// Axum handler for Paystack webhooks.
pub async fn handle_paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResult {
    // Authenticate before touching the payload. The signature covers the
    // raw body bytes exactly as received, so no parsing happens first.
    let signature = match headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok()) {
        Some(s) => s,
        None => return (StatusCode::UNAUTHORIZED, "Missing signature"),
    };
    if !state.gateway.verify_webhook_signature(&body, signature) {
        tracing::warn!("Rejected Paystack webhook with invalid signature");
        return (StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    let event: PaystackWebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to parse Paystack webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    // Events outside the three charge outcomes are acknowledged before any
    // reference handling. They may carry no reference at all, or one in a
    // foreign format (transfer references do not route to a site).
    let kind = match event.event.as_str() {
        "charge.success" => ChargeEvent::Success,
        "charge.failed" => ChargeEvent::Failed,
        "charge.timeout" => ChargeEvent::Timeout,
        other => {
            tracing::debug!("Ignoring Paystack event '{}'", other);
            return (StatusCode::OK, "Event ignored");
        }
    };

    let reference = match event.data.get("reference").and_then(|v| v.as_str()) {
        Some(r) => r.to_string(),
        None => {
            tracing::warn!("Paystack event '{}' carries no reference", event.event);
            return (StatusCode::BAD_REQUEST, "Missing transaction reference");
        }
    };

    let (site, pool) = match state.tenants.resolve_reference(&reference) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!("Cannot route webhook reference '{}': {}", reference, e);
            return (StatusCode::BAD_REQUEST, "Unroutable reference");
        }
    };

    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to get DB connection for site {}: {}", site, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    // The raw event data is stored on the row for later inspection.
    let gateway_response = event.data.to_string();

    match kind {
        ChargeEvent::Success => process_charge_success(&conn, site, &reference, &gateway_response),
        ChargeEvent::Failed => process_charge_failed(&conn, site, &reference, &gateway_response),
        ChargeEvent::Timeout => process_charge_timeout(&conn, site, &reference, &gateway_response),
    }
}

/// Settle a successful charge: flip the transaction to success exactly once,
/// then grant what it paid for.
fn process_charge_success(
    conn: &Connection,
    site: &str,
    reference: &str,
    gateway_response: &str,
) -> WebhookResult {
    let transaction = match queries::find_transaction_by_reference(conn, reference) {
        Ok(Some(t)) => t,
        Ok(None) => {
            // The pending row is written before the payer is redirected to
            // Paystack, so a success event for an unknown reference means
            // the row was never provisioned. Answering 404 makes Paystack
            // redeliver instead of dropping a real payment.
            tracing::warn!(
                "charge.success for unknown reference {} on site {}",
                reference,
                site
            );
            return (StatusCode::NOT_FOUND, "Transaction not found");
        }
        Err(e) => {
            tracing::error!("DB error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    // Success is terminal. Redeliveries of an already-settled charge are
    // acknowledged without touching anything.
    if transaction.status == TransactionStatus::Success {
        return (StatusCode::OK, "Already processed");
    }

    match queries::try_mark_transaction_success(conn, reference, gateway_response) {
        Ok(true) => {}
        // A concurrent delivery won the gate between our read and this write.
        Ok(false) => return (StatusCode::OK, "Already processed"),
        Err(e) => {
            tracing::error!("DB error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    }

    // The status flip above and the effect below are separate writes. A
    // crash between them leaves a success row whose effect never ran, and
    // the redelivery that follows acks on the already-success check without
    // repairing it. Closing that window needs an effect-applied marker on
    // the transaction row.
    if let Err(e) = apply_success_effect(conn, &transaction) {
        tracing::error!(
            "Failed to apply {} effect for {}: {}",
            transaction.transaction_type,
            reference,
            e
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to apply payment effect",
        );
    }

    tracing::info!(
        "Processed charge.success: site={}, reference={}, type={}, amount_kobo={}",
        site,
        reference,
        transaction.transaction_type,
        transaction.amount_kobo
    );
    (StatusCode::OK, "OK")
}

/// A failed charge only moves the row if it is still pending. Late failure
/// events after a success must not regress the ledger, and must not bounce,
/// so a no-op is still a final ack.
fn process_charge_failed(
    conn: &Connection,
    site: &str,
    reference: &str,
    gateway_response: &str,
) -> WebhookResult {
    match queries::try_mark_transaction_failed(conn, reference, gateway_response) {
        Ok(true) => {
            tracing::info!(
                "Processed charge.failed: site={}, reference={}",
                site,
                reference
            );
            (StatusCode::OK, "OK")
        }
        Ok(false) => (StatusCode::OK, "No pending transaction"),
        Err(e) => {
            tracing::error!("DB error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Same shape as `charge.failed`: abandoned is only reachable from pending.
fn process_charge_timeout(
    conn: &Connection,
    site: &str,
    reference: &str,
    gateway_response: &str,
) -> WebhookResult {
    match queries::try_mark_transaction_abandoned(conn, reference, gateway_response) {
        Ok(true) => {
            tracing::info!(
                "Processed charge.timeout: site={}, reference={}",
                site,
                reference
            );
            (StatusCode::OK, "OK")
        }
        Ok(false) => (StatusCode::OK, "No pending transaction"),
        Err(e) => {
            tracing::error!("DB error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
