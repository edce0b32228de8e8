use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use crewgate_access::{Operation, Target};
use crewgate_ledger::AccessService;

use crate::app::{dto, errors};
use crate::authz;
use crate::context::AccessContext;

/// Members of the caller's own workspace. The workspace id comes from the
/// resolved access record, never from the request.
pub async fn list(
    Extension(service): Extension<Arc<AccessService>>,
    Extension(context): Extension<AccessContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&context, Operation::ListMembers, Target::OwnScope) {
        return resp;
    }

    match service.workspace_members(context.record()).await {
        Ok(members) => {
            Json(members.iter().map(dto::member_to_json).collect::<Vec<_>>()).into_response()
        }
        Err(err) => errors::access_error_to_response(err),
    }
}
