use crewgate_access::AccessRecord;
use crewgate_core::PrincipalId;

/// The principal identifier forwarded by the identity layer.
///
/// Present on every `/api` request; carrying it proves only that the header
/// was there, not that the principal maps to a known user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId) -> Self {
        Self { principal_id }
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }
}

/// The one access record computed for this request.
///
/// The middleware resolves it exactly once and inserts it here; handlers
/// and guards read it from request extensions and never resolve again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    principal_id: PrincipalId,
    record: AccessRecord,
}

impl AccessContext {
    pub fn new(principal_id: PrincipalId, record: AccessRecord) -> Self {
        Self {
            principal_id,
            record,
        }
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    pub fn record(&self) -> &AccessRecord {
        &self.record
    }
}
