use axum::{
    routing::{get, post},
    Router,
};

pub mod invites;
pub mod members;
pub mod pages;
pub mod system;
pub mod workspaces;

/// API routes that require a resolved access record.
pub fn member_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/invites", post(invites::create).get(invites::list))
        .route("/invites/revoke", post(invites::revoke))
        .route("/workspace/members", get(members::list))
}

/// API routes for principals that may not be members yet.
pub fn entry_router() -> Router {
    Router::new()
        .route("/workspaces", post(workspaces::signup))
        .route("/invites/accept", post(invites::accept))
}
