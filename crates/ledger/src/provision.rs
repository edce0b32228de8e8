//! Provisioning: the first-auth hook, workspace signup, and the membership
//! listing that demonstrates record-scoped storage filtering.

use tracing::{info, instrument};

use crewgate_access::{AccessRecord, Operation, Target, authorize};
use crewgate_core::{AccessError, AccessResult, EmailAddress, PrincipalId};
use crewgate_store::{
    CreateUserParams, CreateWorkspaceParams, MemberRecord, StoreError, UserRecord, WorkspaceRecord,
};

use crate::service::{AccessService, store_unavailable};

/// How a provisioned principal enters the system.
///
/// Required and explicit: `Member` rows carry no platform stamp,
/// `PlatformOperator` rows do. There is deliberately no default, so a call
/// site that forgets to choose does not compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionedAs {
    Member,
    PlatformOperator,
}

impl ProvisionedAs {
    fn direct_operator(self) -> bool {
        matches!(self, ProvisionedAs::PlatformOperator)
    }
}

impl AccessService {
    /// Idempotent first-auth hook.
    ///
    /// Reuses an existing user by principal, or by email (linking the
    /// principal to it), and creates one otherwise. `provisioned_as`
    /// applies only when a row is created; an existing row keeps its
    /// stored stamp.
    #[instrument(skip(self, email), err)]
    pub async fn provision_principal(
        &self,
        principal: &PrincipalId,
        email: &EmailAddress,
        provisioned_as: ProvisionedAs,
    ) -> AccessResult<UserRecord> {
        match self
            .store_call("user_by_principal", self.store.user_by_principal(principal))
            .await
        {
            Ok(user) => return Ok(user),
            Err(StoreError::NotFound) => {}
            Err(err) => return Err(store_unavailable("user_by_principal", err)),
        }

        match self
            .store_call("user_by_email", self.store.user_by_email(email))
            .await
        {
            Ok(user) => return self.link_or_verify_principal(user, principal).await,
            Err(StoreError::NotFound) => {}
            Err(err) => return Err(store_unavailable("user_by_email", err)),
        }

        let params = CreateUserParams {
            principal_id: Some(principal.clone()),
            email: email.clone(),
            direct_operator: provisioned_as.direct_operator(),
        };
        match self
            .store_call("create_user", self.store.create_user(&params))
            .await
        {
            Ok(user) => {
                info!(user_id = %user.id, operator = user.direct_operator, "user provisioned");
                Ok(user)
            }
            Err(StoreError::AlreadyExists) => {
                // A concurrent first-auth call created the row; reuse it.
                match self
                    .store_call("user_by_principal", self.store.user_by_principal(principal))
                    .await
                {
                    Ok(user) => Ok(user),
                    Err(StoreError::NotFound) => Err(AccessError::validation(
                        "email is already linked to a different sign-in",
                    )),
                    Err(err) => Err(store_unavailable("user_by_principal", err)),
                }
            }
            Err(err) => Err(store_unavailable("create_user", err)),
        }
    }

    /// Workspace signup: the workspace and its owner's AdminGrant, one
    /// transaction. Refused when the owner already belongs anywhere.
    #[instrument(skip(self), err)]
    pub async fn provision_workspace(
        &self,
        owner_principal: &PrincipalId,
        name: &str,
    ) -> AccessResult<(WorkspaceRecord, AccessRecord)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccessError::validation("workspace name must not be empty"));
        }

        let owner = match self
            .store_call(
                "user_by_principal",
                self.store.user_by_principal(owner_principal),
            )
            .await
        {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AccessError::Unauthenticated),
            Err(err) => return Err(store_unavailable("user_by_principal", err)),
        };

        let grants = self
            .store_call("grants_for_user", self.store.grants_for_user(owner.id))
            .await
            .map_err(|err| store_unavailable("grants_for_user", err))?;
        if !grants.admin.is_empty() {
            return Err(AccessError::already_admin());
        }
        if !grants.staff.is_empty() {
            return Err(AccessError::already_staff());
        }

        let params = CreateWorkspaceParams {
            name: name.to_string(),
            owner_id: owner.id,
        };
        let workspace = match self
            .store_call("create_workspace", self.store.create_workspace(&params))
            .await
        {
            Ok(workspace) => workspace,
            // The per-user grant uniqueness arbitrates concurrent signups.
            Err(StoreError::AlreadyExists | StoreError::Conflict) => {
                return Err(AccessError::already_admin());
            }
            Err(err) => return Err(store_unavailable("create_workspace", err)),
        };

        info!(workspace_id = %workspace.id, owner_id = %owner.id, "workspace provisioned");

        let record = self.require_record(owner_principal).await?;
        Ok((workspace, record))
    }

    /// Members of the caller's own workspace.
    ///
    /// The workspace id comes from the access record, never from the
    /// request, so a scoped caller cannot list another workspace by naming
    /// it. Platform operators have no workspace of their own here.
    #[instrument(skip(self), err)]
    pub async fn workspace_members(
        &self,
        record: &AccessRecord,
    ) -> AccessResult<Vec<MemberRecord>> {
        authorize(record, Operation::ListMembers, Target::OwnScope)?;

        let workspace_id = record.workspace_id().ok_or_else(|| {
            AccessError::validation("platform operators are not scoped to a workspace")
        })?;

        self.store_call(
            "workspace_members",
            self.store.workspace_members(workspace_id),
        )
        .await
        .map_err(|err| store_unavailable("workspace_members", err))
    }

    /// Ensure `principal` is the sign-in linked to `user`.
    ///
    /// Links it when the user has none; tolerates losing that race to an
    /// identical link. Any other principal on the row, or this principal
    /// already owning a different row, is refused.
    pub(crate) async fn link_or_verify_principal(
        &self,
        user: UserRecord,
        principal: &PrincipalId,
    ) -> AccessResult<UserRecord> {
        match user.principal_id.as_ref() {
            Some(linked) if linked == principal => Ok(user),
            Some(_) => Err(AccessError::validation(
                "email is already linked to a different sign-in",
            )),
            None => {
                match self
                    .store_call("link_principal", self.store.link_principal(user.id, principal))
                    .await
                {
                    Ok(()) => Ok(UserRecord {
                        principal_id: Some(principal.clone()),
                        ..user
                    }),
                    Err(StoreError::AlreadyExists) => Err(AccessError::validation(
                        "this sign-in is already linked to a different account",
                    )),
                    Err(StoreError::Conflict) => {
                        match self
                            .store_call(
                                "user_by_principal",
                                self.store.user_by_principal(principal),
                            )
                            .await
                        {
                            Ok(fresh) if fresh.id == user.id => Ok(fresh),
                            Ok(_) | Err(StoreError::NotFound) => Err(AccessError::validation(
                                "email is already linked to a different sign-in",
                            )),
                            Err(err) => Err(store_unavailable("user_by_principal", err)),
                        }
                    }
                    Err(err) => Err(store_unavailable("link_principal", err)),
                }
            }
        }
    }
}
