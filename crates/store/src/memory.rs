//! In-memory store backend.
//!
//! Intended for tests and store-less development. It enforces the same
//! uniqueness rules as the Postgres schema (case-insensitive email,
//! principal, one StaffGrant per user, one AdminGrant per user and kind,
//! unique invite tokens) so ledger behavior is identical on both backends.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crewgate_core::{EmailAddress, InternalUserId, InviteId, PrincipalId, WorkspaceId};

use crate::error::StoreError;
use crate::records::{
    AcceptGrant, AdminGrantRecord, CreateInviteParams, CreateUserParams, CreateWorkspaceParams,
    InviteRecord, InviteStatus, MemberRecord, StaffGrantRecord, UserGrants, UserRecord,
    WorkspaceRecord,
};
use crate::store::AccessStore;
use crewgate_access::Role;

#[derive(Debug, Default)]
struct State {
    users: HashMap<InternalUserId, UserRecord>,
    workspaces: HashMap<WorkspaceId, WorkspaceRecord>,
    admin_grants: Vec<AdminGrantRecord>,
    staff_grants: Vec<StaffGrantRecord>,
    invites: HashMap<InviteId, InviteRecord>,
}

impl State {
    fn user_by_email(&self, email: &EmailAddress) -> Option<&UserRecord> {
        self.users.values().find(|u| u.email == *email)
    }

    fn principal_taken(&self, principal: &PrincipalId) -> bool {
        self.users
            .values()
            .any(|u| u.principal_id.as_ref() == Some(principal))
    }

    fn has_platform_admin_grant(&self, user_id: InternalUserId) -> bool {
        self.admin_grants
            .iter()
            .any(|g| g.user_id == user_id && g.workspace_id.is_none())
    }

    fn has_workspace_admin_grant(&self, user_id: InternalUserId) -> bool {
        self.admin_grants
            .iter()
            .any(|g| g.user_id == user_id && g.workspace_id.is_some())
    }

    fn has_staff_grant(&self, user_id: InternalUserId) -> bool {
        self.staff_grants.iter().any(|g| g.user_id == user_id)
    }
}

/// In-memory implementation of [`AccessStore`].
///
/// Not optimized for performance; every method takes one lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait::async_trait]
impl AccessStore for InMemoryStore {
    // ───────────────────────────── Users ─────────────────────────────

    async fn create_user(&self, params: &CreateUserParams) -> Result<UserRecord, StoreError> {
        let mut state = self.write()?;

        if state.user_by_email(&params.email).is_some() {
            return Err(StoreError::AlreadyExists);
        }
        if let Some(principal) = &params.principal_id {
            if state.principal_taken(principal) {
                return Err(StoreError::AlreadyExists);
            }
        }

        let record = UserRecord {
            id: InternalUserId::new(),
            principal_id: params.principal_id.clone(),
            email: params.email.clone(),
            direct_operator: params.direct_operator,
            created_at: Utc::now(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn user_by_principal(&self, principal: &PrincipalId) -> Result<UserRecord, StoreError> {
        let state = self.read()?;
        state
            .users
            .values()
            .find(|u| u.principal_id.as_ref() == Some(principal))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn user_by_email(&self, email: &EmailAddress) -> Result<UserRecord, StoreError> {
        let state = self.read()?;
        state
            .user_by_email(email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn link_principal(
        &self,
        user_id: InternalUserId,
        principal: &PrincipalId,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;

        if state.principal_taken(principal) {
            return Err(StoreError::AlreadyExists);
        }
        let user = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        if user.principal_id.is_some() {
            return Err(StoreError::Conflict);
        }
        user.principal_id = Some(principal.clone());
        Ok(())
    }

    // ───────────────────────────── Workspaces ─────────────────────────────

    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<WorkspaceRecord, StoreError> {
        let mut state = self.write()?;

        if !state.users.contains_key(&params.owner_id) {
            return Err(StoreError::NotFound);
        }
        // Same arbiter as the partial unique index: one workspace-scope
        // AdminGrant per user. Checked before inserting anything so a
        // refusal leaves no workspace row behind.
        if state.has_workspace_admin_grant(params.owner_id) {
            return Err(StoreError::AlreadyExists);
        }

        let record = WorkspaceRecord {
            id: WorkspaceId::new(),
            name: params.name.clone(),
            owner_id: params.owner_id,
            created_at: Utc::now(),
        };
        state.workspaces.insert(record.id, record.clone());
        state.admin_grants.push(AdminGrantRecord {
            user_id: params.owner_id,
            workspace_id: Some(record.id),
            granted_at: record.created_at,
        });
        Ok(record)
    }

    async fn workspace_by_id(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<WorkspaceRecord, StoreError> {
        let state = self.read()?;
        state
            .workspaces
            .get(&workspace_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    // ───────────────────────────── Grants ─────────────────────────────

    async fn grants_for_user(&self, user_id: InternalUserId) -> Result<UserGrants, StoreError> {
        let state = self.read()?;
        Ok(UserGrants {
            admin: state
                .admin_grants
                .iter()
                .filter(|g| g.user_id == user_id)
                .copied()
                .collect(),
            staff: state
                .staff_grants
                .iter()
                .filter(|g| g.user_id == user_id)
                .copied()
                .collect(),
        })
    }

    async fn workspace_members(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<MemberRecord>, StoreError> {
        let state = self.read()?;

        let mut members = Vec::new();
        for grant in &state.admin_grants {
            if grant.workspace_id != Some(workspace_id) {
                continue;
            }
            if let Some(user) = state.users.get(&grant.user_id) {
                members.push(MemberRecord {
                    user_id: user.id,
                    email: user.email.clone(),
                    role: Role::WorkspaceAdmin,
                    member_since: grant.granted_at,
                });
            }
        }
        for grant in &state.staff_grants {
            if grant.workspace_id != workspace_id {
                continue;
            }
            if let Some(user) = state.users.get(&grant.user_id) {
                members.push(MemberRecord {
                    user_id: user.id,
                    email: user.email.clone(),
                    role: Role::Staff,
                    member_since: grant.granted_at,
                });
            }
        }

        members.sort_by(|a, b| {
            a.member_since
                .cmp(&b.member_since)
                .then_with(|| a.email.as_str().cmp(b.email.as_str()))
        });
        Ok(members)
    }

    // ───────────────────────────── Invites ─────────────────────────────

    async fn insert_invite(&self, params: &CreateInviteParams) -> Result<InviteRecord, StoreError> {
        let mut state = self.write()?;

        if state.invites.values().any(|i| i.token == params.token) {
            return Err(StoreError::AlreadyExists);
        }

        let record = InviteRecord {
            id: InviteId::new(),
            token: params.token.clone(),
            email: params.email.clone(),
            role: params.role,
            workspace_id: params.workspace_id,
            status: InviteStatus::Pending,
            invited_by: params.invited_by,
            created_at: Utc::now(),
            expires_at: params.expires_at,
            accepted_at: None,
        };
        state.invites.insert(record.id, record.clone());
        Ok(record)
    }

    async fn invite_by_token(&self, token: &str) -> Result<InviteRecord, StoreError> {
        let state = self.read()?;
        state
            .invites
            .values()
            .find(|i| i.token == token)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_invites(
        &self,
        workspace_id: Option<WorkspaceId>,
    ) -> Result<Vec<InviteRecord>, StoreError> {
        let state = self.read()?;
        let mut invites: Vec<InviteRecord> = state
            .invites
            .values()
            .filter(|i| i.workspace_id == workspace_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(invites)
    }

    async fn mark_revoked(&self, invite_id: InviteId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let invite = state
            .invites
            .get_mut(&invite_id)
            .ok_or(StoreError::NotFound)?;
        if invite.status != InviteStatus::Pending {
            return Err(StoreError::Conflict);
        }
        invite.status = InviteStatus::Revoked;
        Ok(())
    }

    async fn accept_invite(
        &self,
        invite_id: InviteId,
        user_id: InternalUserId,
        grant: AcceptGrant,
        accepted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;

        // Grant uniqueness first: a refused grant must leave the invite
        // pending, mirroring the rollback the Postgres backend gets from
        // its transaction.
        match grant {
            AcceptGrant::PlatformOperator => {
                if state.has_platform_admin_grant(user_id) {
                    return Err(StoreError::AlreadyExists);
                }
            }
            AcceptGrant::Staff(_) => {
                if state.has_staff_grant(user_id) {
                    return Err(StoreError::AlreadyExists);
                }
            }
        }

        let invite = state
            .invites
            .get_mut(&invite_id)
            .ok_or(StoreError::NotFound)?;
        if invite.status != InviteStatus::Pending {
            return Err(StoreError::Conflict);
        }
        invite.status = InviteStatus::Accepted;
        invite.accepted_at = Some(accepted_at);

        match grant {
            AcceptGrant::PlatformOperator => state.admin_grants.push(AdminGrantRecord {
                user_id,
                workspace_id: None,
                granted_at: accepted_at,
            }),
            AcceptGrant::Staff(workspace_id) => state.staff_grants.push(StaffGrantRecord {
                user_id,
                workspace_id,
                granted_at: accepted_at,
            }),
        }
        Ok(())
    }
}
