use ctf_standings::config::{StorageConfig, StoreBackend};
use ctf_standings::standings::{StandingsService, StoreError, TableStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn open_store(config: &StorageConfig) -> Result<TableStore, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("using in-memory standings store");
            Ok(TableStore::in_memory())
        }
        StoreBackend::Json => {
            info!(path = %config.data_path.display(), "using json standings store");
            TableStore::open(&config.data_path)
        }
    }
}

pub(crate) fn standings_service(
    config: &StorageConfig,
) -> Result<Arc<StandingsService<TableStore>>, StoreError> {
    let store = Arc::new(open_store(config)?);
    Ok(Arc::new(StandingsService::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctf_standings::standings::StandingsStore;

    #[test]
    fn memory_backend_ignores_data_path() {
        let config = StorageConfig {
            backend: StoreBackend::Memory,
            data_path: "/nonexistent/standings.json".into(),
        };

        let store = open_store(&config).expect("memory store opens");
        assert!(store.snapshot_path().is_none());
        assert!(store.list_groups().expect("groups").is_empty());
    }

    #[test]
    fn json_backend_persists_between_opens() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = StorageConfig {
            backend: StoreBackend::Json,
            data_path: dir.path().join("standings.json"),
        };

        let service = standings_service(&config).expect("store opens");
        service
            .coordinator()
            .add_group("Null Pointers")
            .expect("group added");

        let reopened = open_store(&config).expect("store reopens");
        assert_eq!(reopened.list_groups().expect("groups").len(), 1);
    }
}
