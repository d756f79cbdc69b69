/*
 * Responsibility
 * - v1 URL layout
 * - /health is public; everything in protected() sits behind the
 *   certificate middleware
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{health::health, me::me};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(middleware::auth::certificate::apply(protected(), state))
}

fn protected() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
