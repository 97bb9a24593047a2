use metrics_exporter_prometheus::PrometheusHandle;
use placement::config::AppConfig;
use placement::identity::{Argon2Hasher, UserDirectory};
use placement::storage::{PlacementRepository, RepositoryError, SqliteStore};
use placement::workflows::placement::{PlacementApi, PlacementService, TransitionPolicy};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Open the configured SQLite database, creating the schema on first use.
pub(crate) fn open_store(config: &AppConfig) -> Result<Arc<SqliteStore>, RepositoryError> {
    Ok(Arc::new(SqliteStore::open(&config.storage.database_path)?))
}

/// Wire both services over one shared store.
pub(crate) fn build_api<R>(
    store: Arc<R>,
    policy: TransitionPolicy,
) -> PlacementApi<R, Argon2Hasher>
where
    R: PlacementRepository + 'static,
{
    PlacementApi {
        users: UserDirectory::new(store.clone(), Arc::new(Argon2Hasher::default())),
        placement: PlacementService::with_policy(store, policy),
    }
}
