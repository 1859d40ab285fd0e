//! Backend selection from `[storage]` config.

use std::sync::Arc;

use tracing::info;

use govwatch_core::store::ReportStore;
use govwatch_core::Result;

use crate::config::{BackendKind, Config};
use crate::store_local::LocalStore;
use crate::store_remote::RemoteStore;

/// Build the store named by `storage.backend`.
pub fn open_store(config: &Config) -> Result<Arc<dyn ReportStore>> {
    let store: Arc<dyn ReportStore> = match config.storage.backend {
        BackendKind::Local => {
            let store = LocalStore::from_config(&config.storage.local);
            info!(path = %store.path().display(), key = %config.storage.local.key, "using local store");
            Arc::new(store)
        }
        BackendKind::Remote => {
            info!(base_url = %config.storage.remote.base_url, "using remote store");
            Arc::new(RemoteStore::from_config(&config.storage.remote)?)
        }
    };
    Ok(store)
}
