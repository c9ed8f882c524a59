use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn platforms() -> Router<AppState> {
    Router::new().route("/platforms", get(handlers::list_platforms))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts", get(handlers::list_posts))
        .route("/posts/preview", post(handlers::preview_post))
        .route("/posts/calendar", get(handlers::calendar))
        .route("/posts/:id", get(handlers::get_post))
        .route("/posts/:id", patch(handlers::update_post))
        .route("/posts/:id", delete(handlers::delete_post))
}

pub fn accounts() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(handlers::list_accounts))
        .route("/accounts/callback", post(handlers::oauth_callback))
        .route("/accounts/:platform/connect", post(handlers::connect_account))
        .route(
            "/accounts/:platform",
            delete(handlers::disconnect_account),
        )
}
