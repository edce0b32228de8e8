//! API-side authorization guard.
//!
//! Handlers call this before touching the ledger, with the operation and
//! target the request itself names. It consults the same shared policy
//! table as the edge router and the ledger; the surfaces differ only in
//! how a denial is rendered.

use axum::response::Response;

use crewgate_access::{authorize, Operation, Target};

use crate::app::errors;
use crate::context::AccessContext;

/// Check one operation against the request's resolved access record.
///
/// A denial is already rendered as the API's JSON 403 so handlers can
/// return it directly.
pub fn require(
    context: &AccessContext,
    operation: Operation,
    target: Target,
) -> Result<(), Response> {
    authorize(context.record(), operation, target).map_err(errors::access_error_to_response)
}
