use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AdminToken, AuthUser};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    // Media arrives base64-encoded inside JSON, so allow for the encoding
    // overhead on top of the raw upload cap.
    let body_limit = (state.upload_max_bytes as usize).saturating_mul(2);

    let v1 = Router::new()
        .merge(routes::platforms())
        .merge(routes::posts())
        .merge(routes::accounts());

    Router::new()
        .merge(routes::health())
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
