/*
 * Responsibility
 * - v1 URL structure
 * - the API server webhook posts TokenReviews to /api/v1/tokenreviews
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{health::health, review::review_token};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/tokenreviews", post(review_token))
}
