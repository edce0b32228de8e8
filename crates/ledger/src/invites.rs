//! The invite lifecycle: create, accept, revoke, list.
//!
//! Stored state is `pending → accepted | revoked`; expiry is derived at
//! read time and never written back. Acceptance runs a fixed gate sequence
//! where every refusal has its own taxonomy entry, so the caller can tell
//! "bad link" from "expired" from "already used" without guessing.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};

use crewgate_access::{
    AccessRecord, Operation, PlatformSentinel, Resolution, Role, Target, authorize,
};
use crewgate_core::{
    AccessError, AccessResult, EmailAddress, InternalUserId, InviteId, PrincipalId, WorkspaceId,
};
use crewgate_store::{
    AcceptGrant, CreateInviteParams, CreateUserParams, InviteRecord, InviteStatus, StoreError,
    UserRecord,
};

use crate::service::{AccessService, store_unavailable};

/// Alphanumeric token length; log2(62) * 48 ≈ 285 bits of entropy.
const INVITE_TOKEN_LEN: usize = 48;

/// Scope of an invite, named explicitly at creation.
///
/// Never inferred from the inviter's own role; the caller states which
/// scope it means and authorization checks that statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteScope {
    Platform,
    Workspace(WorkspaceId),
}

impl InviteScope {
    /// Normalize a stored workspace reference. A NULL column and the
    /// reserved sentinel id both mean platform scope.
    pub fn from_stored(workspace_id: Option<WorkspaceId>, sentinel: PlatformSentinel) -> Self {
        match workspace_id {
            Some(ws) if !sentinel.is_sentinel(ws) => InviteScope::Workspace(ws),
            _ => InviteScope::Platform,
        }
    }

    /// The stored encoding: platform scope writes NULL, never the sentinel.
    pub fn workspace_id(&self) -> Option<WorkspaceId> {
        match self {
            InviteScope::Platform => None,
            InviteScope::Workspace(ws) => Some(*ws),
        }
    }
}

/// Read-time lifecycle state of an invite.
///
/// `Expired` exists only here: the store keeps such rows `pending` and the
/// deadline comparison happens on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    Pending,
    Accepted,
    Revoked,
    Expired,
}

impl InviteState {
    fn derive(record: &InviteRecord, now: DateTime<Utc>) -> Self {
        match record.status {
            InviteStatus::Accepted => InviteState::Accepted,
            InviteStatus::Revoked => InviteState::Revoked,
            InviteStatus::Pending if now > record.expires_at => InviteState::Expired,
            InviteStatus::Pending => InviteState::Pending,
        }
    }
}

/// An invite as listed to administrators. Carries no token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteSummary {
    pub id: InviteId,
    pub email: EmailAddress,
    pub role: Role,
    /// `None` is platform scope; legacy sentinel encodings are normalized
    /// away before the summary leaves the ledger.
    pub workspace_id: Option<WorkspaceId>,
    pub state: InviteState,
    pub invited_by: InternalUserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl InviteSummary {
    fn from_record(record: InviteRecord, sentinel: PlatformSentinel, now: DateTime<Utc>) -> Self {
        let state = InviteState::derive(&record, now);
        let scope = InviteScope::from_stored(record.workspace_id, sentinel);
        Self {
            id: record.id,
            email: record.email,
            role: record.role,
            workspace_id: scope.workspace_id(),
            state,
            invited_by: record.invited_by,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

/// Result of creating an invite: the one value that carries the token.
///
/// Serializable because the create response is the single place the token
/// is allowed to travel; it is never listed or logged afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedInvite {
    pub id: InviteId,
    pub token: String,
    pub email: EmailAddress,
    pub workspace_id: Option<WorkspaceId>,
    pub expires_at: DateTime<Utc>,
}

fn mint_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl AccessService {
    /// Create a pending invite in an explicitly named scope.
    ///
    /// The inviter is resolved fresh here, never trusted from a cached
    /// record: platform scope requires `platform_operator`, workspace scope
    /// requires `workspace_admin` of exactly that workspace (operators may
    /// invite into any workspace). Only the `staff` role is invitable.
    #[instrument(skip(self, email), err)]
    pub async fn create_invite(
        &self,
        inviter: &PrincipalId,
        email: &EmailAddress,
        role: Role,
        scope: InviteScope,
    ) -> AccessResult<CreatedInvite> {
        let record = self.require_record(inviter).await?;
        let scope = InviteScope::from_stored(scope.workspace_id(), self.sentinel());

        match scope {
            InviteScope::Platform => {
                authorize(&record, Operation::CreatePlatformInvite, Target::Platform)?
            }
            InviteScope::Workspace(ws) => {
                authorize(&record, Operation::CreateWorkspaceInvite, Target::Workspace(ws))?
            }
        }

        if role != Role::Staff {
            return Err(AccessError::validation(format!(
                "only the staff role can be invited, not {role}"
            )));
        }

        if let InviteScope::Workspace(ws) = scope {
            match self
                .store_call("workspace_by_id", self.store.workspace_by_id(ws))
                .await
            {
                Ok(_) => {}
                Err(StoreError::NotFound) => {
                    return Err(AccessError::validation("workspace does not exist"));
                }
                Err(err) => return Err(store_unavailable("workspace_by_id", err)),
            }
        }

        let token = mint_token();
        let params = CreateInviteParams {
            token: token.clone(),
            email: email.clone(),
            role,
            workspace_id: scope.workspace_id(),
            invited_by: record.user_id(),
            expires_at: Utc::now() + self.config.invite_ttl,
        };

        let invite = match self
            .store_call("insert_invite", self.store.insert_invite(&params))
            .await
        {
            Ok(invite) => invite,
            Err(StoreError::AlreadyExists) => {
                return Err(AccessError::store_unavailable("invite token collision"));
            }
            Err(err) => return Err(store_unavailable("insert_invite", err)),
        };

        info!(invite_id = %invite.id, "invite created");

        Ok(CreatedInvite {
            id: invite.id,
            token,
            email: invite.email,
            workspace_id: invite.workspace_id,
            expires_at: invite.expires_at,
        })
    }

    /// Accept an invite: the fixed gate sequence, then one transaction.
    ///
    /// Gate order is part of the contract. Token lookup and status first
    /// (`InviteInvalid` / `InviteAlreadyUsed`), expiry second
    /// (`InviteExpired`), email match third (`EmailMismatch`), then the
    /// user is reused or created, membership exclusivity is checked
    /// (`AlreadyMember`), and finally the store flips the invite and
    /// inserts the grant atomically. Returns the accepting user's fresh
    /// access record.
    #[instrument(skip(self, token, email), err)]
    pub async fn accept_invite(
        &self,
        token: &str,
        email: &EmailAddress,
        principal: &PrincipalId,
    ) -> AccessResult<AccessRecord> {
        let invite = match self
            .store_call("invite_by_token", self.store.invite_by_token(token))
            .await
        {
            Ok(invite) => invite,
            Err(StoreError::NotFound) => return Err(AccessError::InviteInvalid),
            Err(err) => return Err(store_unavailable("invite_by_token", err)),
        };

        match invite.status {
            InviteStatus::Revoked => return Err(AccessError::InviteInvalid),
            InviteStatus::Accepted => return Err(AccessError::InviteAlreadyUsed),
            InviteStatus::Pending => {}
        }

        let now = Utc::now();
        if invite.is_expired(now) {
            return Err(AccessError::InviteExpired);
        }

        if invite.email != *email {
            return Err(AccessError::EmailMismatch);
        }

        let user = self.user_for_accept(email, principal).await?;

        let grants = self
            .store_call("grants_for_user", self.store.grants_for_user(user.id))
            .await
            .map_err(|err| store_unavailable("grants_for_user", err))?;
        if !grants.admin.is_empty() {
            return Err(AccessError::already_admin());
        }
        if !grants.staff.is_empty() {
            return Err(AccessError::already_staff());
        }

        let grant = match InviteScope::from_stored(invite.workspace_id, self.sentinel()) {
            InviteScope::Platform => AcceptGrant::PlatformOperator,
            InviteScope::Workspace(ws) => AcceptGrant::Staff(ws),
        };

        match self
            .store_call(
                "accept_invite",
                self.store.accept_invite(invite.id, user.id, grant, now),
            )
            .await
        {
            Ok(()) => {}
            // The pending guard lost: a concurrent accept landed first.
            Err(StoreError::Conflict) => return Err(AccessError::InviteAlreadyUsed),
            Err(StoreError::NotFound) => return Err(AccessError::InviteInvalid),
            Err(StoreError::AlreadyExists) => {
                // A grant landed between the exclusivity check and the
                // transaction; report which membership blocked it.
                let grants = self
                    .store_call("grants_for_user", self.store.grants_for_user(user.id))
                    .await
                    .map_err(|err| store_unavailable("grants_for_user", err))?;
                return Err(if grants.admin.is_empty() {
                    AccessError::already_staff()
                } else {
                    AccessError::already_admin()
                });
            }
            Err(err) => return Err(store_unavailable("accept_invite", err)),
        }

        info!(invite_id = %invite.id, user_id = %user.id, "invite accepted");

        match self.resolve(principal).await? {
            Resolution::Authenticated(record) => Ok(record),
            // The grant committed a moment ago; not seeing it means the
            // store went inconsistent under us.
            Resolution::Unauthenticated => Err(AccessError::store_unavailable(
                "accepted grant not visible on re-read",
            )),
        }
    }

    /// Revoke a pending invite. Terminal rows are a no-op success.
    #[instrument(skip(self, token), err)]
    pub async fn revoke_invite(
        &self,
        token: &str,
        acting_principal: &PrincipalId,
    ) -> AccessResult<()> {
        let record = self.require_record(acting_principal).await?;

        let invite = match self
            .store_call("invite_by_token", self.store.invite_by_token(token))
            .await
        {
            Ok(invite) => invite,
            Err(StoreError::NotFound) => return Err(AccessError::InviteInvalid),
            Err(err) => return Err(store_unavailable("invite_by_token", err)),
        };

        match InviteScope::from_stored(invite.workspace_id, self.sentinel()) {
            InviteScope::Platform => authorize(&record, Operation::RevokeInvite, Target::Platform)?,
            InviteScope::Workspace(ws) => {
                authorize(&record, Operation::RevokeInvite, Target::Workspace(ws))?
            }
        }

        match self
            .store_call("mark_revoked", self.store.mark_revoked(invite.id))
            .await
        {
            Ok(()) => {
                info!(invite_id = %invite.id, "invite revoked");
                Ok(())
            }
            // Already terminal; revoking twice (or after accept) is a no-op.
            Err(StoreError::Conflict) => Ok(()),
            Err(StoreError::NotFound) => Err(AccessError::InviteInvalid),
            Err(err) => Err(store_unavailable("mark_revoked", err)),
        }
    }

    /// List invites in one scope, newest first, with read-time expiry
    /// applied. Platform listings include legacy sentinel-encoded rows.
    #[instrument(skip(self), err)]
    pub async fn list_invites(
        &self,
        acting_principal: &PrincipalId,
        scope: InviteScope,
    ) -> AccessResult<Vec<InviteSummary>> {
        let record = self.require_record(acting_principal).await?;
        let scope = InviteScope::from_stored(scope.workspace_id(), self.sentinel());

        let mut invites = match scope {
            InviteScope::Platform => {
                authorize(&record, Operation::ListInvites, Target::Platform)?;
                let mut rows = self
                    .store_call("list_invites", self.store.list_invites(None))
                    .await
                    .map_err(|err| store_unavailable("list_invites", err))?;
                let legacy = self
                    .store_call(
                        "list_invites",
                        self.store.list_invites(Some(self.sentinel().workspace_id())),
                    )
                    .await
                    .map_err(|err| store_unavailable("list_invites", err))?;
                rows.extend(legacy);
                rows
            }
            InviteScope::Workspace(ws) => {
                authorize(&record, Operation::ListInvites, Target::Workspace(ws))?;
                self.store_call("list_invites", self.store.list_invites(Some(ws)))
                    .await
                    .map_err(|err| store_unavailable("list_invites", err))?
            }
        };

        invites.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });

        let now = Utc::now();
        let sentinel = self.sentinel();
        Ok(invites
            .into_iter()
            .map(|record| InviteSummary::from_record(record, sentinel, now))
            .collect())
    }

    /// Gate four of accept: reuse the user owning the invited email or
    /// create one, ensuring the accepting principal ends up linked to it.
    async fn user_for_accept(
        &self,
        email: &EmailAddress,
        principal: &PrincipalId,
    ) -> AccessResult<UserRecord> {
        match self
            .store_call("user_by_email", self.store.user_by_email(email))
            .await
        {
            Ok(user) => self.link_or_verify_principal(user, principal).await,
            Err(StoreError::NotFound) => {
                let params = CreateUserParams {
                    principal_id: Some(principal.clone()),
                    email: email.clone(),
                    direct_operator: false,
                };
                match self
                    .store_call("create_user", self.store.create_user(&params))
                    .await
                {
                    Ok(user) => Ok(user),
                    Err(StoreError::AlreadyExists) => {
                        // Either the email or the principal raced us into
                        // existence; a re-read tells which.
                        match self
                            .store_call("user_by_email", self.store.user_by_email(email))
                            .await
                        {
                            Ok(user) => self.link_or_verify_principal(user, principal).await,
                            Err(StoreError::NotFound) => Err(AccessError::validation(
                                "this sign-in is already linked to a different account",
                            )),
                            Err(err) => Err(store_unavailable("user_by_email", err)),
                        }
                    }
                    Err(err) => Err(store_unavailable("create_user", err)),
                }
            }
            Err(err) => Err(store_unavailable("user_by_email", err)),
        }
    }
}
