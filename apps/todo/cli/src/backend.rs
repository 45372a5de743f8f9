//! Backend selection: which repository the service talks to.

use core_config::{ApiConfig, BackendConfig, BackendKind, StorageConfig};
use domain_todos::{
    FileStorage, LocalTodoRepository, RemoteTodoRepository, STORAGE_KEY, TodoApiClient,
    TodoRepository, TodoResult, TodoService,
};
use std::path::PathBuf;
use tracing::debug;

/// Command-line overrides, applied on top of the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub backend: Option<BackendKind>,
    pub api_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

pub fn apply_overrides(mut config: BackendConfig, overrides: Overrides) -> BackendConfig {
    if let Some(kind) = overrides.backend {
        config.kind = kind;
    }
    if let Some(url) = overrides.api_url {
        config.api = ApiConfig::new(url, config.api.timeout);
    }
    if let Some(dir) = overrides.data_dir {
        config.storage = StorageConfig::new(dir);
    }
    config
}

pub fn open_repository(config: &BackendConfig) -> TodoResult<Box<dyn TodoRepository>> {
    match config.kind {
        BackendKind::Local => {
            debug!(data_dir = %config.storage.data_dir.display(), "Opening local store");
            let storage = FileStorage::new(&config.storage.data_dir);
            Ok(Box::new(LocalTodoRepository::open(storage)?))
        }
        BackendKind::Remote => {
            debug!(base_url = %config.api.base_url, "Using remote todo API");
            let client = TodoApiClient::new(&config.api)?;
            let storage = FileStorage::new(&config.storage.data_dir);
            Ok(Box::new(RemoteTodoRepository::new(client, storage)?))
        }
    }
}

/// Human-readable status of the configured backend
pub async fn health<R: TodoRepository>(
    config: &BackendConfig,
    service: &TodoService<R>,
) -> TodoResult<String> {
    match config.kind {
        BackendKind::Local => {
            let todos = service.list_todos().await?;
            let path = FileStorage::new(&config.storage.data_dir).path_for(STORAGE_KEY);
            Ok(format!(
                "Local store OK: {} todo(s) in {}",
                todos.len(),
                path.display()
            ))
        }
        BackendKind::Remote => {
            let client = TodoApiClient::new(&config.api)?;
            let status = client.health().await?;
            Ok(format!("{}: {}", client.base_url(), status))
        }
    }
}
