//! HTTP application wiring (Axum router + middleware layering).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers (one file per surface area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crewgate_ledger::AccessService;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(service: Arc<AccessService>) -> Router {
    let access_state = middleware::AccessState {
        service: service.clone(),
    };

    // Member-only API routes sit behind the resolving layer; the entry
    // routes (workspace signup, invite accept) need only the principal
    // header, since their callers may not have a user row yet.
    let api = routes::member_router()
        .layer(axum::middleware::from_fn_with_state(
            access_state.clone(),
            middleware::require_access_record,
        ))
        .merge(routes::entry_router())
        .layer(Extension(service))
        .layer(axum::middleware::from_fn(middleware::require_principal));

    let pages = routes::pages::router().layer(axum::middleware::from_fn_with_state(
        access_state,
        middleware::edge_pages,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/signin", get(routes::pages::signin))
        .route("/not-permitted", get(routes::pages::not_permitted))
        .nest("/api", api)
        .merge(pages)
        .layer(ServiceBuilder::new())
}
