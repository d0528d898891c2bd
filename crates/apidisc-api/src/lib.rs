//! apidisc-api - Discovery REST layer
//!
//! This crate holds the [`ResourceManager`], the in-process store of a
//! discovery document, and the HTTP router that serves it. The manager is
//! both the aggregator's publisher and a backend in its own right, so a
//! process can list its own groups next to the remote ones.
//!
//! # Usage
//!
//! ```ignore
//! use apidisc_api::{create_router, AppState, ResourceManager};
//!
//! let merged = Arc::new(ResourceManager::new());
//! let router = create_router(AppState::new(merged.clone()));
//! axum::serve(listener, router).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod resource_manager;
pub mod state;

pub use error::ApiError;
pub use resource_manager::{ResourceManager, Snapshot};
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the discovery router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/readyz", get(handlers::health::readyz))
        .route("/apis", get(handlers::discovery::get_apis))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
