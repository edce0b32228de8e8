use serde::Serialize;

use crewgate_core::{InternalUserId, WorkspaceId};

use crate::roles::Role;

/// The resolution engine's sole output: one user, one role, one scope.
///
/// Never persisted; recomputed per request. Construction goes through the
/// named constructors so a role can never carry an inconsistent scope:
/// `platform_operator` has no workspace, `workspace_admin` and `staff` have
/// exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    user_id: InternalUserId,
    role: Role,
    workspace_id: Option<WorkspaceId>,
}

impl AccessRecord {
    pub fn platform_operator(user_id: InternalUserId) -> Self {
        Self {
            user_id,
            role: Role::PlatformOperator,
            workspace_id: None,
        }
    }

    pub fn workspace_admin(user_id: InternalUserId, workspace_id: WorkspaceId) -> Self {
        Self {
            user_id,
            role: Role::WorkspaceAdmin,
            workspace_id: Some(workspace_id),
        }
    }

    pub fn staff(user_id: InternalUserId, workspace_id: WorkspaceId) -> Self {
        Self {
            user_id,
            role: Role::Staff,
            workspace_id: Some(workspace_id),
        }
    }

    pub fn user_id(&self) -> InternalUserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// `None` means platform scope, not "no scope".
    pub fn workspace_id(&self) -> Option<WorkspaceId> {
        self.workspace_id
    }
}

/// Outcome of resolving a principal.
///
/// `Unauthenticated` is a defined terminal state, not an error; store
/// failures are reported separately so callers can fail closed on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(AccessRecord),
    Unauthenticated,
}

impl Resolution {
    pub fn record(&self) -> Option<&AccessRecord> {
        match self {
            Resolution::Authenticated(record) => Some(record),
            Resolution::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Resolution::Authenticated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_operator_has_no_workspace() {
        let record = AccessRecord::platform_operator(InternalUserId::new());
        assert_eq!(record.role(), Role::PlatformOperator);
        assert_eq!(record.workspace_id(), None);
    }

    #[test]
    fn scoped_roles_carry_exactly_one_workspace() {
        let user = InternalUserId::new();
        let ws = WorkspaceId::new();

        let admin = AccessRecord::workspace_admin(user, ws);
        assert_eq!(admin.workspace_id(), Some(ws));

        let staff = AccessRecord::staff(user, ws);
        assert_eq!(staff.workspace_id(), Some(ws));
    }

    #[test]
    fn resolution_record_accessor() {
        let record = AccessRecord::platform_operator(InternalUserId::new());
        assert_eq!(Resolution::Authenticated(record).record(), Some(&record));
        assert_eq!(Resolution::Unauthenticated.record(), None);
    }
}
