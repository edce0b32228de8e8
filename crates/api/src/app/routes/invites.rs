use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crewgate_access::{Operation, Target};
use crewgate_ledger::{AccessService, InviteScope};

use crate::app::{dto, errors};
use crate::authz;
use crate::context::{AccessContext, PrincipalContext};

/// Issue an invite. The create response is the only place the token
/// travels; listings never carry it.
pub async fn create(
    Extension(service): Extension<Arc<AccessService>>,
    Extension(context): Extension<AccessContext>,
    Json(req): Json<dto::CreateInviteRequest>,
) -> axum::response::Response {
    let email = match dto::parse_email(&req.email) {
        Ok(email) => email,
        Err(resp) => return resp,
    };
    let role = match dto::parse_role(&req.role) {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    let scope = match dto::parse_scope(req.workspace_id.as_deref()) {
        Ok(scope) => scope,
        Err(resp) => return resp,
    };

    if let Err(resp) = authz::require(&context, create_operation(&scope), scope_target(&scope)) {
        return resp;
    }

    match service
        .create_invite(context.principal_id(), &email, role, scope)
        .await
    {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => errors::access_error_to_response(err),
    }
}

/// List invites in one scope, newest first, token-free.
pub async fn list(
    Extension(service): Extension<Arc<AccessService>>,
    Extension(context): Extension<AccessContext>,
    Query(query): Query<dto::ListInvitesQuery>,
) -> axum::response::Response {
    let scope = match dto::parse_scope(query.workspace_id.as_deref()) {
        Ok(scope) => scope,
        Err(resp) => return resp,
    };

    if let Err(resp) = authz::require(&context, Operation::ListInvites, scope_target(&scope)) {
        return resp;
    }

    match service.list_invites(context.principal_id(), scope).await {
        Ok(invites) => Json(invites).into_response(),
        Err(err) => errors::access_error_to_response(err),
    }
}

/// Accept an invite. An entry route: the accepting principal usually has
/// no user row yet, so there is no access record to guard on here; the
/// ledger runs the full gate sequence itself.
pub async fn accept(
    Extension(service): Extension<Arc<AccessService>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(req): Json<dto::AcceptInviteRequest>,
) -> axum::response::Response {
    let email = match dto::parse_email(&req.email) {
        Ok(email) => email,
        Err(resp) => return resp,
    };

    match service
        .accept_invite(&req.token, &email, principal.principal_id())
        .await
    {
        Ok(record) => Json(json!({ "access": record })).into_response(),
        Err(err) => errors::access_error_to_response(err),
    }
}

/// Revoke a pending invite. The scope is only known once the ledger loads
/// the row, so authorization happens there.
pub async fn revoke(
    Extension(service): Extension<Arc<AccessService>>,
    Extension(context): Extension<AccessContext>,
    Json(req): Json<dto::RevokeInviteRequest>,
) -> axum::response::Response {
    match service
        .revoke_invite(&req.token, context.principal_id())
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::access_error_to_response(err),
    }
}

fn create_operation(scope: &InviteScope) -> Operation {
    match scope {
        InviteScope::Platform => Operation::CreatePlatformInvite,
        InviteScope::Workspace(_) => Operation::CreateWorkspaceInvite,
    }
}

fn scope_target(scope: &InviteScope) -> Target {
    match scope {
        InviteScope::Platform => Target::Platform,
        InviteScope::Workspace(workspace_id) => Target::Workspace(*workspace_id),
    }
}
