use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crewgate_access::{authorize, edge_operation, Resolution, Target};
use crewgate_core::PrincipalId;
use crewgate_ledger::AccessService;

use crate::app::errors;
use crate::context::{AccessContext, PrincipalContext};

/// Header carrying the stable principal identifier, set by the identity
/// layer in front of this service (trusted-proxy contract).
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

#[derive(Clone)]
pub struct AccessState {
    pub service: Arc<AccessService>,
}

/// Outer `/api` layer: every API request must carry a principal header.
///
/// Inserts [`PrincipalContext`]. Does not touch the store; entry endpoints
/// (signup, invite accept) serve principals that have no user row yet.
pub async fn require_principal(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(principal) = extract_principal(req.headers()) else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "sign in required");
    };

    req.extensions_mut().insert(PrincipalContext::new(principal));
    next.run(req).await
}

/// Inner layer for member-only API routes: resolves the principal exactly
/// once and inserts the [`AccessContext`] every downstream guard reads.
///
/// An unknown principal is 401, an unreachable store 503. Handlers behind
/// this layer never resolve again.
pub async fn require_access_record(
    State(state): State<AccessState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>().cloned() else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "sign in required");
    };

    let record = match state.service.resolve(principal.principal_id()).await {
        Ok(Resolution::Authenticated(record)) => record,
        Ok(Resolution::Unauthenticated) => {
            return errors::json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "sign in required",
            );
        }
        Err(err) => return errors::access_error_to_response(err),
    };

    let principal_id = principal.principal_id().clone();
    req.extensions_mut()
        .insert(AccessContext::new(principal_id, record));
    next.run(req).await
}

/// Edge layer for browser pages: anonymous visitors of a gated page go to
/// `/signin`, authenticated ones without the required role to
/// `/not-permitted`. Ungated pages pass through, with the access context
/// attached when the visitor resolved.
pub async fn edge_pages(
    State(state): State<AccessState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let gate = edge_operation(req.uri().path());

    let Some(principal) = extract_principal(req.headers()) else {
        return match gate {
            Some(_) => Redirect::to("/signin").into_response(),
            None => next.run(req).await,
        };
    };

    let resolution = match state.service.resolve(&principal).await {
        Ok(resolution) => resolution,
        // Fail closed: an unreachable store denies every page.
        Err(_) => {
            return (StatusCode::SERVICE_UNAVAILABLE, "access could not be verified")
                .into_response();
        }
    };

    let record = match resolution {
        Resolution::Authenticated(record) => record,
        Resolution::Unauthenticated => {
            return match gate {
                Some(_) => Redirect::to("/signin").into_response(),
                None => next.run(req).await,
            };
        }
    };

    if let Some(operation) = gate {
        if authorize(&record, operation, Target::OwnScope).is_err() {
            return Redirect::to("/not-permitted").into_response();
        }
    }

    req.extensions_mut().insert(AccessContext::new(principal, record));
    next.run(req).await
}

fn extract_principal(headers: &HeaderMap) -> Option<PrincipalId> {
    let value = headers.get(PRINCIPAL_HEADER)?;
    let value = value.to_str().ok()?;

    PrincipalId::new(value.trim()).ok()
}
