//! Priority-ordered candidate resolution.
//!
//! A principal's memberships live in several relations (a direct stamp on
//! the user row, admin grants, staff grants). Resolution collapses them to
//! exactly one `(role, workspace)` pair by gathering an explicit
//! tagged-priority candidate list and selecting the highest-priority entry.
//! The ordering rule lives here as data, not inside a store query, so it is
//! unit-testable without a store.
//!
//! Selection over a fixed snapshot is pure: no IO, no clock reads, no
//! mutation. Calling it twice with the same snapshot yields the same record.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crewgate_core::{InternalUserId, WorkspaceId};

use crate::record::{AccessRecord, Resolution};

/// The reserved platform workspace id, injected from configuration.
///
/// Platform scope is normally a NULL workspace reference; historical data
/// and the invite table also encode it with this reserved id. There is one
/// value per process and components receive it explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformSentinel(WorkspaceId);

impl PlatformSentinel {
    pub fn new(workspace_id: WorkspaceId) -> Self {
        Self(workspace_id)
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.0
    }

    pub fn is_sentinel(&self, workspace_id: WorkspaceId) -> bool {
        workspace_id == self.0
    }

    /// Platform scope is a NULL reference or the reserved id, never "no scope".
    pub fn is_platform_scope(&self, workspace_id: Option<WorkspaceId>) -> bool {
        match workspace_id {
            None => true,
            Some(ws) => self.is_sentinel(ws),
        }
    }
}

/// An AdminGrant row as loaded from the membership store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGrantRow {
    /// `None` denotes platform-wide scope.
    pub workspace_id: Option<WorkspaceId>,
    pub granted_at: DateTime<Utc>,
}

/// A StaffGrant row as loaded from the membership store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffGrantRow {
    pub workspace_id: WorkspaceId,
    pub granted_at: DateTime<Utc>,
}

/// Point-in-time view of everything resolution needs for one user.
///
/// The caller loads this (the engine itself does no IO). The vectors
/// tolerate anomalous duplicates; the write path prevents them, selection
/// merely survives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSnapshot {
    pub user_id: InternalUserId,
    /// Direct `platform_operator` stamp on the user row itself.
    pub direct_operator: bool,
    /// When the user row was created; orders the direct stamp among candidates.
    pub user_created_at: DateTime<Utc>,
    pub admin_grants: Vec<AdminGrantRow>,
    pub staff_grants: Vec<StaffGrantRow>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidate list
// ─────────────────────────────────────────────────────────────────────────────

/// Source slot of a candidate in the fixed resolution order. Lower wins.
///
/// Two independent paths can produce a platform operator (the direct stamp
/// and a platform-scoped AdminGrant); both are always checked because
/// historical data or alternate provisioning may populate either.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CandidateSource {
    DirectStamp,
    PlatformGrant,
    WorkspaceAdminGrant,
    StaffGrant,
}

/// Role and scope of a candidate, packed so they cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRole {
    PlatformOperator,
    WorkspaceAdmin(WorkspaceId),
    Staff(WorkspaceId),
}

/// One tagged entry in the priority-ordered candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub source: CandidateSource,
    pub role: CandidateRole,
    pub granted_at: DateTime<Utc>,
}

impl Candidate {
    fn scope_uuid(&self) -> Option<Uuid> {
        match self.role {
            CandidateRole::PlatformOperator => None,
            CandidateRole::WorkspaceAdmin(ws) | CandidateRole::Staff(ws) => Some(*ws.as_uuid()),
        }
    }
}

/// Gather all candidates for a user, normalizing sentinel-scoped admin
/// grants to platform scope.
pub fn gather_candidates(snapshot: &GrantSnapshot, sentinel: PlatformSentinel) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    if snapshot.direct_operator {
        candidates.push(Candidate {
            source: CandidateSource::DirectStamp,
            role: CandidateRole::PlatformOperator,
            granted_at: snapshot.user_created_at,
        });
    }

    for grant in &snapshot.admin_grants {
        match grant.workspace_id {
            Some(ws) if !sentinel.is_sentinel(ws) => candidates.push(Candidate {
                source: CandidateSource::WorkspaceAdminGrant,
                role: CandidateRole::WorkspaceAdmin(ws),
                granted_at: grant.granted_at,
            }),
            // A NULL workspace and the reserved sentinel both mean platform
            // scope; neither may surface as a workspace_admin of a strange id.
            _ => candidates.push(Candidate {
                source: CandidateSource::PlatformGrant,
                role: CandidateRole::PlatformOperator,
                granted_at: grant.granted_at,
            }),
        }
    }

    for grant in &snapshot.staff_grants {
        if sentinel.is_sentinel(grant.workspace_id) {
            // No write path produces staff rows pointing at the sentinel;
            // keep the row at face value but flag it.
            tracing::warn!(
                user_id = %snapshot.user_id,
                "staff grant references the platform sentinel workspace"
            );
        }
        candidates.push(Candidate {
            source: CandidateSource::StaffGrant,
            role: CandidateRole::Staff(grant.workspace_id),
            granted_at: grant.granted_at,
        });
    }

    candidates
}

/// Select the single highest-priority candidate.
///
/// Ties within a source slot are a data anomaly (e.g. two AdminGrants);
/// they are broken by earliest grant, then workspace id for a total order,
/// and logged. Returns `None` when the list is empty.
pub fn select(user_id: InternalUserId, mut candidates: Vec<Candidate>) -> Option<AccessRecord> {
    candidates.sort_by_key(|c| (c.source, c.granted_at, c.scope_uuid()));

    let winner = *candidates.first()?;

    let tied = candidates
        .iter()
        .filter(|c| c.source == winner.source)
        .count();
    if tied > 1 {
        tracing::warn!(
            user_id = %user_id,
            source = ?winner.source,
            tied,
            "multiple membership rows tied at the winning priority; using the earliest-created"
        );
    }

    Some(match winner.role {
        CandidateRole::PlatformOperator => AccessRecord::platform_operator(user_id),
        CandidateRole::WorkspaceAdmin(ws) => AccessRecord::workspace_admin(user_id, ws),
        CandidateRole::Staff(ws) => AccessRecord::staff(user_id, ws),
    })
}

/// Resolve a snapshot to its single access record.
///
/// An empty candidate list is the defined `Unauthenticated` state, not an
/// error.
pub fn resolve_snapshot(snapshot: &GrantSnapshot, sentinel: PlatformSentinel) -> Resolution {
    let candidates = gather_candidates(snapshot, sentinel);
    match select(snapshot.user_id, candidates) {
        Some(record) => Resolution::Authenticated(record),
        None => Resolution::Unauthenticated,
    }
}
