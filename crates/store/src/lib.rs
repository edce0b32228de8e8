//! `crewgate-store` — persistence for users, workspaces, grants, and invites.
//!
//! The [`AccessStore`] trait is the seam: the ledger depends on it, the
//! Postgres backend implements it for deployment, and [`InMemoryStore`]
//! implements it for tests and store-less development with identical
//! uniqueness semantics.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    AcceptGrant, AdminGrantRecord, CreateInviteParams, CreateUserParams, CreateWorkspaceParams,
    InviteRecord, InviteStatus, MemberRecord, StaffGrantRecord, UserGrants, UserRecord,
    WorkspaceRecord,
};
pub use store::AccessStore;
