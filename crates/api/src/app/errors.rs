use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crewgate_core::AccessError;

/// Render a domain error as the API's JSON error shape.
///
/// `InviteExpired` keeps its own status so clients can tell a stale invite
/// (410, ask for a new one) from a dead token (404). Store trouble never
/// leaks backend detail; the body says only that access could not be
/// verified.
pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "sign in required")
        }
        AccessError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", "not permitted")
        }
        AccessError::InviteInvalid => json_error(
            StatusCode::NOT_FOUND,
            "invite_invalid",
            "invite not found or revoked",
        ),
        AccessError::InviteExpired => {
            json_error(StatusCode::GONE, "invite_expired", "invite has expired")
        }
        AccessError::InviteAlreadyUsed => json_error(
            StatusCode::CONFLICT,
            "invite_already_used",
            "invite was already accepted",
        ),
        AccessError::EmailMismatch => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "email_mismatch",
            "invite was issued to a different email",
        ),
        AccessError::AlreadyMember(conflict) => {
            json_error(StatusCode::CONFLICT, "already_member", conflict.to_string())
        }
        AccessError::Validation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
        }
        AccessError::StoreUnavailable(_) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            "access could not be verified",
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
