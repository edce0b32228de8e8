//! The storage trait the ledger depends on.
//!
//! Backends (Postgres for deployment, the in-memory store for tests and
//! store-less development) implement this trait; nothing above it knows
//! which backend is active. Methods are individually atomic, and
//! [`AccessStore::accept_invite`] is the one multi-statement transaction in
//! the system.

use chrono::{DateTime, Utc};

use crewgate_core::{EmailAddress, InternalUserId, InviteId, PrincipalId, WorkspaceId};

use crate::error::StoreError;
use crate::records::{
    AcceptGrant, CreateInviteParams, CreateUserParams, CreateWorkspaceParams, InviteRecord,
    MemberRecord, UserGrants, UserRecord, WorkspaceRecord,
};

#[async_trait::async_trait]
pub trait AccessStore: Send + Sync {
    // ───────────────────────────── Users ─────────────────────────────

    /// Insert a user row. `AlreadyExists` when the email or principal is
    /// already taken; email comparison is case-insensitive.
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserRecord, StoreError>;

    async fn user_by_principal(&self, principal: &PrincipalId) -> Result<UserRecord, StoreError>;

    async fn user_by_email(&self, email: &EmailAddress) -> Result<UserRecord, StoreError>;

    /// Attach a principal to a user provisioned without one. Guarded: fails
    /// with `Conflict` when some principal is already linked, even the same
    /// one; callers re-read and decide.
    async fn link_principal(
        &self,
        user_id: InternalUserId,
        principal: &PrincipalId,
    ) -> Result<(), StoreError>;

    // ───────────────────────────── Workspaces ─────────────────────────────

    /// Insert the workspace and its owner's workspace-scope AdminGrant in
    /// one transaction.
    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<WorkspaceRecord, StoreError>;

    async fn workspace_by_id(&self, workspace_id: WorkspaceId)
        -> Result<WorkspaceRecord, StoreError>;

    // ───────────────────────────── Grants ─────────────────────────────

    /// Both grant tables for one user. Empty vectors are a normal result.
    async fn grants_for_user(&self, user_id: InternalUserId) -> Result<UserGrants, StoreError>;

    /// Admins and staff of a workspace, with emails, for the membership
    /// listing surface.
    async fn workspace_members(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<MemberRecord>, StoreError>;

    // ───────────────────────────── Invites ─────────────────────────────

    /// Insert a pending invite. `AlreadyExists` on a token collision.
    async fn insert_invite(&self, params: &CreateInviteParams) -> Result<InviteRecord, StoreError>;

    async fn invite_by_token(&self, token: &str) -> Result<InviteRecord, StoreError>;

    /// Pending and terminal invites in one scope: `Some(ws)` for a
    /// workspace, `None` for platform scope.
    async fn list_invites(
        &self,
        workspace_id: Option<WorkspaceId>,
    ) -> Result<Vec<InviteRecord>, StoreError>;

    /// `pending → revoked`. `Conflict` when the row is no longer pending;
    /// callers treat that as the idempotent no-op it is.
    async fn mark_revoked(&self, invite_id: InviteId) -> Result<(), StoreError>;

    /// The accept transaction: flip the invite from `pending` to `accepted`
    /// and insert the grant, atomically.
    ///
    /// The pending-status guard makes exactly one of two concurrent accepts
    /// win; the loser gets `Conflict`. A grant uniqueness violation
    /// (`AlreadyExists`) rolls the whole transaction back, leaving the
    /// invite pending and existing grants untouched.
    async fn accept_invite(
        &self,
        invite_id: InviteId,
        user_id: InternalUserId,
        grant: AcceptGrant,
        accepted_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
