//! The single role→operation mapping shared by every enforcement surface.
//!
//! Edge routing, API authorization, and storage filtering all consult this
//! table; none of them carries a private copy of the rules. Surfaces stay
//! thin adapters: they translate a request into an [`Operation`] and a
//! [`Target`], then call [`authorize`].

use crewgate_core::{AccessError, AccessResult, WorkspaceId};

use crate::record::AccessRecord;
use crate::roles::Role;

/// Every access-controlled operation in the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Enter the platform administration area.
    ViewAdminArea,
    /// Enter the workspace dashboard.
    ViewWorkspaceArea,
    /// Issue an invite carrying platform scope.
    CreatePlatformInvite,
    /// Issue an invite into a specific workspace.
    CreateWorkspaceInvite,
    /// List invites within a scope.
    ListInvites,
    /// Revoke a pending invite.
    RevokeInvite,
    /// List the members of a workspace.
    ListMembers,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::ViewAdminArea,
        Operation::ViewWorkspaceArea,
        Operation::CreatePlatformInvite,
        Operation::CreateWorkspaceInvite,
        Operation::ListInvites,
        Operation::RevokeInvite,
        Operation::ListMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ViewAdminArea => "view_admin_area",
            Operation::ViewWorkspaceArea => "view_workspace_area",
            Operation::CreatePlatformInvite => "create_platform_invite",
            Operation::CreateWorkspaceInvite => "create_workspace_invite",
            Operation::ListInvites => "list_invites",
            Operation::RevokeInvite => "revoke_invite",
            Operation::ListMembers => "list_members",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles permitted to perform an operation. This is the whole policy.
pub fn allowed_roles(operation: Operation) -> &'static [Role] {
    match operation {
        Operation::ViewAdminArea | Operation::CreatePlatformInvite => &[Role::PlatformOperator],
        Operation::CreateWorkspaceInvite | Operation::ListInvites | Operation::RevokeInvite => {
            &[Role::PlatformOperator, Role::WorkspaceAdmin]
        }
        Operation::ViewWorkspaceArea | Operation::ListMembers => {
            &[Role::PlatformOperator, Role::WorkspaceAdmin, Role::Staff]
        }
    }
}

/// Scope a request is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Platform-wide; only platform operators qualify.
    Platform,
    /// One specific workspace, named by the request.
    Workspace(WorkspaceId),
    /// Whatever scope the caller's own record carries.
    OwnScope,
}

/// Authorize one operation against one resolved record.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// Both a role miss and a scope miss yield the same `Unauthorized`; callers
/// learn that they may not, never why.
pub fn authorize(record: &AccessRecord, operation: Operation, target: Target) -> AccessResult<()> {
    if !allowed_roles(operation).contains(&record.role()) {
        return Err(AccessError::Unauthorized);
    }

    match target {
        Target::Platform => {
            if record.role() != Role::PlatformOperator {
                return Err(AccessError::Unauthorized);
            }
        }
        Target::Workspace(workspace_id) => {
            // Operators act across workspaces; everyone else only inside
            // the one workspace their record names.
            if record.role() != Role::PlatformOperator
                && record.workspace_id() != Some(workspace_id)
            {
                return Err(AccessError::Unauthorized);
            }
        }
        Target::OwnScope => {}
    }

    Ok(())
}

/// Where the edge sends a freshly resolved principal.
pub fn landing_path(role: Role) -> &'static str {
    match role {
        Role::PlatformOperator => "/admin",
        Role::WorkspaceAdmin | Role::Staff => "/dashboard",
    }
}

/// Map an edge path to the operation it requires, if it is gated at all.
pub fn edge_operation(path: &str) -> Option<Operation> {
    let area = |prefix: &str| path == prefix || path.starts_with(&format!("{prefix}/"));

    if area("/admin") {
        Some(Operation::ViewAdminArea)
    } else if area("/dashboard") {
        Some(Operation::ViewWorkspaceArea)
    } else {
        None
    }
}
