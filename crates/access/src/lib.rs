//! `crewgate-access` — pure resolution and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it resolves
//! a membership snapshot to exactly one access record and answers policy
//! questions about it. Loading snapshots and enforcing answers belong to
//! the store and API layers.

pub mod policy;
pub mod record;
pub mod resolve;
pub mod roles;

pub use policy::{allowed_roles, authorize, edge_operation, landing_path, Operation, Target};
pub use record::{AccessRecord, Resolution};
pub use resolve::{
    gather_candidates, resolve_snapshot, AdminGrantRow, Candidate, CandidateRole, CandidateSource,
    GrantSnapshot, PlatformSentinel, StaffGrantRow,
};
pub use roles::Role;
