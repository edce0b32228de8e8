use std::sync::Arc;
use std::time::Duration;

use crewgate_access::PlatformSentinel;
use crewgate_core::WorkspaceId;
use crewgate_ledger::{AccessService, ServiceConfig};
use crewgate_store::{AccessStore, InMemoryStore, PostgresStore};

#[tokio::main]
async fn main() {
    crewgate_observability::init();

    let sentinel = platform_sentinel_from_env();

    let mut config = ServiceConfig::new(sentinel);
    if let Some(days) = env_number::<i64>("INVITE_TTL_DAYS") {
        config.invite_ttl = chrono::Duration::days(days);
    }
    if let Some(ms) = env_number::<u64>("STORE_TIMEOUT_MS") {
        config.store_timeout = Duration::from_millis(ms);
    }

    let store: Arc<dyn AccessStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => Arc::new(
            PostgresStore::open(&url)
                .await
                .expect("failed to open the postgres store"),
        ),
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; falling back to the in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let service = Arc::new(AccessService::new(store, config));
    let app = crewgate_api::app::build_app(service);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind listen address");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

/// The platform sentinel is injected, never a per-file constant. A dev
/// boot without one gets a fresh id, which matches nothing in the store.
fn platform_sentinel_from_env() -> PlatformSentinel {
    match std::env::var("PLATFORM_WORKSPACE_ID") {
        Ok(raw) => {
            let id: WorkspaceId = raw.parse().expect("PLATFORM_WORKSPACE_ID must be a UUID");
            PlatformSentinel::new(id)
        }
        Err(_) => {
            tracing::warn!("PLATFORM_WORKSPACE_ID not set; generating one for this boot");
            PlatformSentinel::new(WorkspaceId::new())
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("{name} is not a number; keeping the default");
            None
        }
    }
}
