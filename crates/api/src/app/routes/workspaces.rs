use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crewgate_ledger::{AccessService, ProvisionedAs};

use crate::app::{dto, errors};
use crate::context::PrincipalContext;

/// Workspace signup: provisions the caller as a user if needed, then
/// creates the workspace with them as its admin. Refused when the caller
/// already belongs somewhere.
pub async fn signup(
    Extension(service): Extension<Arc<AccessService>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(req): Json<dto::SignupWorkspaceRequest>,
) -> axum::response::Response {
    let email = match dto::parse_email(&req.email) {
        Ok(email) => email,
        Err(resp) => return resp,
    };

    if let Err(err) = service
        .provision_principal(principal.principal_id(), &email, ProvisionedAs::Member)
        .await
    {
        return errors::access_error_to_response(err);
    }

    match service
        .provision_workspace(principal.principal_id(), &req.name)
        .await
    {
        Ok((workspace, record)) => (
            StatusCode::CREATED,
            Json(json!({
                "workspace": dto::workspace_to_json(&workspace),
                "access": record,
            })),
        )
            .into_response(),
        Err(err) => errors::access_error_to_response(err),
    }
}
