use std::path::Path;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{handlers, state::AppState};

pub fn create_router(state: AppState, site_dir: &Path) -> Router {
    // Browser origin is not restricted
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route(
            "/api/translate",
            post(handlers::translate)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .route("/api/health", get(handlers::health))
        .with_state(state);

    // Everything else is the static site
    api.fallback_service(ServeDir::new(site_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
