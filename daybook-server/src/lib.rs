// Library exports for daybook-server
// The binary and the integration tests both build the router from here

pub mod api;
pub mod config;
pub mod db;
pub mod session;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full HTTP router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/validate", get(api::auth::validate_session))
        // Post routes
        .route("/posts", get(api::posts::get_posts).post(api::posts::create_post))
        .route(
            "/posts/:id",
            get(api::posts::get_post)
                .put(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route("/posts/:id/completed", put(api::posts::set_completed))
        .route(
            "/posts/:id/like",
            get(api::likes::get_like)
                .post(api::likes::like_post)
                .delete(api::likes::unlike_post),
        )
        // Follow routes
        .route("/follows", post(api::follows::create_follow))
        .route("/follows/outgoing", get(api::follows::get_outgoing))
        .route("/follows/incoming", get(api::follows::get_incoming))
        .route("/follows/:id", axum::routing::delete(api::follows::delete_follow))
        .route("/follows/:id/status", put(api::follows::update_status))
        // Privileged functions
        .route("/functions/delete-account", post(api::functions::delete_account))
        .route("/functions/set-username", post(api::functions::set_username))
        .route("/functions/search-users", get(api::functions::search_users))
        .route(
            "/functions/schedule",
            get(api::functions::list_schedule).post(api::functions::create_schedule_entry),
        )
        .route(
            "/functions/schedule/:id",
            put(api::functions::update_schedule_entry).delete(api::functions::delete_schedule_entry),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}
