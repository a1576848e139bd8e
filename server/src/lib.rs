use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod utils;
pub mod validation;

use state::AppState;

/// Builds the full application router: public auth endpoints plus the
/// Bearer-protected routes, with CORS and request tracing layered on top.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/signup", post(handlers::auth::signup))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/refresh", post(handlers::auth::refresh))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/reset-password", post(handlers::auth::reset_password));

    let protected_routes = Router::new()
        .route("/api/logout-all", post(handlers::auth::logout_all))
        .route("/api/update-password", put(handlers::auth::update_password))
        .route("/api/profile", get(handlers::auth::profile))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
