//! Access-domain error model.

use thiserror::Error;

/// Result type used across the access core.
pub type AccessResult<T> = Result<T, AccessError>;

/// Which existing membership blocked a new grant.
///
/// Carried by [`AccessError::AlreadyMember`] so the two violation kinds stay
/// distinguishable to callers and to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipConflict {
    /// The user already holds an AdminGrant (platform or workspace scope).
    ExistingAdmin,
    /// The user already holds a StaffGrant somewhere.
    ExistingStaff,
}

impl core::fmt::Display for MembershipConflict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ExistingAdmin => f.write_str("already an administrator"),
            Self::ExistingStaff => f.write_str("already a staff member elsewhere"),
        }
    }
}

/// Domain-level error for the access core.
///
/// Every variant maps to a distinct, actionable caller-facing message.
/// Infrastructure failures travel as `StoreUnavailable` and must be treated
/// as a denial by every enforcement surface, never as an implicit allow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No internal user matches the principal. A defined terminal state for
    /// resolution; an error only for operations that require an identity.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated but lacking the role or scope for the operation.
    #[error("not permitted")]
    Unauthorized,

    /// Invite token not found, or revoked.
    #[error("invite link is not valid")]
    InviteInvalid,

    /// Invite found but past its expiry. Distinct from `InviteInvalid` so
    /// callers can say "request a new invite" instead of "check your link".
    #[error("invite has expired")]
    InviteExpired,

    /// Invite was already accepted.
    #[error("invite has already been used")]
    InviteAlreadyUsed,

    /// Claimed email does not match the invite's target email.
    #[error("email does not match this invite")]
    EmailMismatch,

    /// Mutual-exclusion or single-workspace violation on accept.
    #[error("{0}")]
    AlreadyMember(MembershipConflict),

    /// A value failed validation (malformed input at the boundary).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backing store failed or timed out. Always fail closed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AccessError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn already_admin() -> Self {
        Self::AlreadyMember(MembershipConflict::ExistingAdmin)
    }

    pub fn already_staff() -> Self {
        Self::AlreadyMember(MembershipConflict::ExistingStaff)
    }
}
