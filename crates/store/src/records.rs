//! Persisted record types and write parameters.
//!
//! These are storage-shaped rows, not API DTOs: the API layer builds its own
//! response types and never serializes an [`InviteRecord`] (the token column
//! must not travel further than the create call that returns it).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crewgate_access::Role;
use crewgate_core::{EmailAddress, InternalUserId, InviteId, PrincipalId, WorkspaceId};

/// InternalUser row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: InternalUserId,
    /// `None` until the first sign-in links the external principal.
    pub principal_id: Option<PrincipalId>,
    pub email: EmailAddress,
    /// Direct `platform_operator` stamp on the user row itself.
    pub direct_operator: bool,
    pub created_at: DateTime<Utc>,
}

/// Workspace row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub owner_id: InternalUserId,
    pub created_at: DateTime<Utc>,
}

/// AdminGrant row. A NULL workspace is platform-wide scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGrantRecord {
    pub user_id: InternalUserId,
    pub workspace_id: Option<WorkspaceId>,
    pub granted_at: DateTime<Utc>,
}

/// StaffGrant row. Staff belong to exactly one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffGrantRecord {
    pub user_id: InternalUserId,
    pub workspace_id: WorkspaceId,
    pub granted_at: DateTime<Utc>,
}

/// Both grant tables for one user, loaded in one store call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserGrants {
    pub admin: Vec<AdminGrantRecord>,
    pub staff: Vec<StaffGrantRecord>,
}

impl UserGrants {
    pub fn is_empty(&self) -> bool {
        self.admin.is_empty() && self.staff.is_empty()
    }
}

/// One member of a workspace, as the membership listing reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub user_id: InternalUserId,
    pub email: EmailAddress,
    pub role: Role,
    pub member_since: DateTime<Utc>,
}

/// Stored invite lifecycle state.
///
/// `expired` is intentionally absent: it is a read-time view of a pending
/// row past its deadline, never a written status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Revoked,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Revoked => "revoked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(InviteStatus::Pending),
            "accepted" => Some(InviteStatus::Accepted),
            "revoked" => Some(InviteStatus::Revoked),
            _ => None,
        }
    }
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// InviteToken row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRecord {
    pub id: InviteId,
    /// Opaque high-entropy secret; returned to the authorized creator once,
    /// looked up on accept/revoke, never logged.
    pub token: String,
    pub email: EmailAddress,
    pub role: Role,
    /// `None` is platform scope. Imports from the predecessor system may
    /// instead carry the reserved platform workspace id here.
    pub workspace_id: Option<WorkspaceId>,
    pub status: InviteStatus,
    pub invited_by: InternalUserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl InviteRecord {
    /// Read-time expiry: a pending row past its deadline. The stored status
    /// never changes to `expired`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == InviteStatus::Pending && now > self.expires_at
    }
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub principal_id: Option<PrincipalId>,
    pub email: EmailAddress,
    pub direct_operator: bool,
}

/// Parameters for creating a workspace together with its owner's
/// workspace-scope AdminGrant.
#[derive(Debug, Clone)]
pub struct CreateWorkspaceParams {
    pub name: String,
    pub owner_id: InternalUserId,
}

/// Parameters for inserting a pending invite.
#[derive(Debug, Clone)]
pub struct CreateInviteParams {
    pub token: String,
    pub email: EmailAddress,
    pub role: Role,
    pub workspace_id: Option<WorkspaceId>,
    pub invited_by: InternalUserId,
    pub expires_at: DateTime<Utc>,
}

/// What acceptance materializes: a platform-scope invite becomes a
/// platform AdminGrant, a workspace invite becomes a StaffGrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptGrant {
    PlatformOperator,
    Staff(WorkspaceId),
}
