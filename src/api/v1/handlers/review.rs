/*
 * Responsibility
 * - POST /tokenreviews handler
 * - decode envelope → extract credentials → directory lookup → status
 * - every failure becomes an error response; nothing here ends the process
 */
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::api::v1::dto::token_review::TokenReview;
use crate::error::AppError;
use crate::services::{identity, token};
use crate::state::AppState;

pub async fn review_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenReview>, JsonRejection>,
) -> Result<Json<TokenReview>, AppError> {
    let Json(mut review) = payload
        .map_err(|rejection| AppError::bad_request("INVALID_REVIEW", rejection.body_text()))?;

    // Take the spec out of the envelope up front: whatever happens below, the
    // token must not appear in the response.
    let spec = review.spec.take().unwrap_or_default();
    let cred = token::extract(&spec.token)
        .map_err(|e| AppError::bad_request("MALFORMED_TOKEN", e.to_string()))?;

    let record = state.directory.lookup(&cred.username, &cred.password).await?;

    let status = identity::resolve(record, &cred.username);
    tracing::info!(
        username = %cred.username,
        authenticated = status.authenticated,
        "token review"
    );
    review.status = Some(status);

    Ok(Json(review))
}
