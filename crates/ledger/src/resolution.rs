//! Store-backed resolution: load the grant snapshot, run the pure engine.

use tracing::instrument;

use crewgate_access::{
    AccessRecord, AdminGrantRow, GrantSnapshot, Resolution, StaffGrantRow, resolve_snapshot,
};
use crewgate_core::{AccessError, AccessResult, PrincipalId};
use crewgate_store::{StoreError, UserGrants, UserRecord};

use crate::service::{AccessService, store_unavailable};

impl AccessService {
    /// Resolve a principal to its single access record.
    ///
    /// An unknown principal (or one with no memberships) is
    /// `Unauthenticated`, a defined outcome. A store failure or timeout is
    /// `StoreUnavailable`; every caller denies on it.
    #[instrument(skip(self), err)]
    pub async fn resolve(&self, principal: &PrincipalId) -> AccessResult<Resolution> {
        let user = match self
            .store_call("user_by_principal", self.store.user_by_principal(principal))
            .await
        {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Ok(Resolution::Unauthenticated),
            Err(err) => return Err(store_unavailable("user_by_principal", err)),
        };

        let grants = self
            .store_call("grants_for_user", self.store.grants_for_user(user.id))
            .await
            .map_err(|err| store_unavailable("grants_for_user", err))?;

        Ok(resolve_snapshot(&snapshot_from(&user, &grants), self.sentinel()))
    }

    /// Resolve and require an authenticated record.
    pub async fn require_record(&self, principal: &PrincipalId) -> AccessResult<AccessRecord> {
        match self.resolve(principal).await? {
            Resolution::Authenticated(record) => Ok(record),
            Resolution::Unauthenticated => Err(AccessError::Unauthenticated),
        }
    }
}

fn snapshot_from(user: &UserRecord, grants: &UserGrants) -> GrantSnapshot {
    GrantSnapshot {
        user_id: user.id,
        direct_operator: user.direct_operator,
        user_created_at: user.created_at,
        admin_grants: grants
            .admin
            .iter()
            .map(|grant| AdminGrantRow {
                workspace_id: grant.workspace_id,
                granted_at: grant.granted_at,
            })
            .collect(),
        staff_grants: grants
            .staff
            .iter()
            .map(|grant| StaffGrantRow {
                workspace_id: grant.workspace_id,
                granted_at: grant.granted_at,
            })
            .collect(),
    }
}
