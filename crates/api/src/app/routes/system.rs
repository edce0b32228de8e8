use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::AccessContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The caller's resolved access record: one user, one role, one scope.
pub async fn whoami(Extension(context): Extension<AccessContext>) -> impl IntoResponse {
    let record = context.record();

    Json(serde_json::json!({
        "user_id": record.user_id().to_string(),
        "role": record.role().as_str(),
        "workspace_id": record.workspace_id().map(|ws| ws.to_string()),
    }))
}
