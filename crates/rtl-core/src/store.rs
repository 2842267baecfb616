use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rtl_config::RtlConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    enabled::{EnabledStore, MemoryStore},
    error::StoreError,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct StoredPreferences {
    rtl_enabled: bool,
}

/// Enabled flag kept in a small JSON file. A missing file reads as the
/// default; a corrupt one is an error.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    default_enabled: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, default_enabled: bool) -> Self {
        Self {
            path: path.into(),
            default_enabled,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnabledStore for JsonFileStore {
    async fn load(&self) -> Result<bool, StoreError> {
        match fs::read(&self.path) {
            Ok(data) => {
                let stored: StoredPreferences = serde_json::from_slice(&data)?;
                Ok(stored.rtl_enabled)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(self.default_enabled),
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, enabled: bool) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&StoredPreferences {
            rtl_enabled: enabled,
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// The store selected by `[storage]`: a JSON file when `path` is set,
/// otherwise in-process memory. Both read `default_enabled` when nothing
/// has been saved.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    File(JsonFileStore),
    Memory(MemoryStore),
}

impl ConfiguredStore {
    pub fn from_config(config: &RtlConfig) -> Self {
        let default_enabled = config.storage.default_enabled;
        match &config.storage.path {
            Some(path) => {
                debug!(path = %path.display(), "enabled flag stored on disk");
                ConfiguredStore::File(JsonFileStore::new(path.clone(), default_enabled))
            }
            None => ConfiguredStore::Memory(MemoryStore::new(default_enabled)),
        }
    }
}

impl EnabledStore for ConfiguredStore {
    async fn load(&self) -> Result<bool, StoreError> {
        match self {
            ConfiguredStore::File(store) => store.load().await,
            ConfiguredStore::Memory(store) => store.load().await,
        }
    }

    async fn save(&self, enabled: bool) -> Result<(), StoreError> {
        match self {
            ConfiguredStore::File(store) => store.save(enabled).await,
            ConfiguredStore::Memory(store) => store.save(enabled).await,
        }
    }
}
