//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Layers (outermost → innermost): CORS → access log → handler.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::clinical::CdsService;

/// Build the API router over a shared `CdsService`.
pub fn api_router(service: Arc<CdsService>) -> Router {
    build_router(ApiContext::new(service))
}

fn build_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/checks/interactions", post(endpoints::checks::interactions))
        .route("/checks/allergies", post(endpoints::checks::allergies))
        .route(
            "/checks/contraindications",
            post(endpoints::checks::contraindications),
        )
        .route("/checks/doses", post(endpoints::checks::doses))
        .route("/checks/all", post(endpoints::checks::all))
        .route("/doses/convert", post(endpoints::convert::convert))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(cors)
}
