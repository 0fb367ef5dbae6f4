pub mod ops;
pub mod payments;
pub mod webhooks;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Public routes: checkout initiation and the post-payment landing page.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/pay/subscriptions", post(payments::initiate_subscription))
        .route("/pay/boosts", post(payments::initiate_boost))
        .route("/pay/callback", get(payments::payment_callback))
}
