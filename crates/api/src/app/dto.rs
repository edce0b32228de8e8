use serde::Deserialize;

use crewgate_access::Role;
use crewgate_core::{EmailAddress, WorkspaceId};
use crewgate_ledger::InviteScope;
use crewgate_store::{MemberRecord, WorkspaceRecord};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignupWorkspaceRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    pub role: String,
    /// Absent means platform scope.
    pub workspace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeInviteRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ListInvitesQuery {
    pub workspace_id: Option<String>,
}

// -------------------------
// Request → domain mapping
// -------------------------

pub fn parse_email(raw: &str) -> Result<EmailAddress, axum::response::Response> {
    EmailAddress::parse(raw).map_err(errors::access_error_to_response)
}

pub fn parse_role(raw: &str) -> Result<Role, axum::response::Response> {
    raw.parse().map_err(errors::access_error_to_response)
}

pub fn parse_scope(workspace_id: Option<&str>) -> Result<InviteScope, axum::response::Response> {
    match workspace_id {
        None => Ok(InviteScope::Platform),
        Some(raw) => {
            let id: WorkspaceId = raw.parse().map_err(errors::access_error_to_response)?;
            Ok(InviteScope::Workspace(id))
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn workspace_to_json(workspace: &WorkspaceRecord) -> serde_json::Value {
    serde_json::json!({
        "id": workspace.id.to_string(),
        "name": workspace.name,
        "owner_id": workspace.owner_id.to_string(),
        "created_at": workspace.created_at.to_rfc3339(),
    })
}

pub fn member_to_json(member: &MemberRecord) -> serde_json::Value {
    serde_json::json!({
        "user_id": member.user_id.to_string(),
        "email": member.email.as_str(),
        "role": member.role.as_str(),
        "member_since": member.member_since.to_rfc3339(),
    })
}
