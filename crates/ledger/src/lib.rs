//! `crewgate-ledger` — store-backed access operations.
//!
//! The ledger orchestrates the storage layer and the pure resolution and
//! policy functions of `crewgate-access` into the operations the HTTP
//! surface exposes: principal resolution, the invite lifecycle, and
//! provisioning. Every operation resolves fresh from the store and
//! translates store errors into the domain taxonomy; raw store errors do
//! not cross this crate's boundary.

pub mod invites;
pub mod provision;
pub mod resolution;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use invites::{CreatedInvite, InviteScope, InviteState, InviteSummary};
pub use provision::ProvisionedAs;
pub use service::{AccessService, ServiceConfig};
