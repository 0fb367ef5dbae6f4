use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::util::extract_bearer_token;

/// Gate ops routes behind the configured bearer token.
///
/// When no token is configured the routes answer 401 across the board, so
/// an unset `OPS_TOKEN` fails closed.
pub async fn require_ops_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = match state.ops_token.as_deref() {
        Some(t) => t,
        None => return Err(StatusCode::UNAUTHORIZED),
    };
    let provided = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
