//! Service wiring: the store handle, injected configuration, and the
//! deadline wrapper every store call goes through.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crewgate_access::PlatformSentinel;
use crewgate_core::AccessError;
use crewgate_store::{AccessStore, StoreError};

/// Runtime configuration for [`AccessService`], read once at startup.
///
/// There is deliberately no `Default`: the platform sentinel differs per
/// deployment and callers must name it.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Reserved workspace id that legacy rows use to mean platform scope.
    pub sentinel: PlatformSentinel,
    /// Upper bound on any single store call before failing closed.
    pub store_timeout: Duration,
    /// Lifetime of a fresh invite, creation to expiry.
    pub invite_ttl: chrono::Duration,
}

impl ServiceConfig {
    pub fn new(sentinel: PlatformSentinel) -> Self {
        Self {
            sentinel,
            store_timeout: Duration::from_millis(5_000),
            invite_ttl: chrono::Duration::days(30),
        }
    }
}

/// Store-backed access operations: resolution, the invite lifecycle, and
/// provisioning.
///
/// One instance per process, shared behind `Arc` by every request handler.
/// All methods re-read the store; nothing caches a role between requests.
pub struct AccessService {
    pub(crate) store: Arc<dyn AccessStore>,
    pub(crate) config: ServiceConfig,
}

impl AccessService {
    pub fn new(store: Arc<dyn AccessStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn sentinel(&self) -> PlatformSentinel {
        self.config.sentinel
    }

    /// Run one store call under the configured deadline.
    ///
    /// A timeout becomes a backend error here; the caller translates any
    /// remaining store error into the domain taxonomy at its own call site,
    /// because the same store outcome means different things per operation.
    pub(crate) async fn store_call<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, "store call exceeded the request deadline");
                Err(StoreError::backend(format!("{operation} timed out")))
            }
        }
    }
}

/// Fold an unexpected store failure into the fail-closed taxonomy entry.
pub(crate) fn store_unavailable(operation: &str, err: StoreError) -> AccessError {
    AccessError::store_unavailable(format!("{operation}: {err}"))
}
