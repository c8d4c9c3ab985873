//! JSON file persistence

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::actions::host::SettingsStore;
use crate::errors::HomeAutoError;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::{GlobalSettings, InstanceSettings};

/// A JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    pub async fn read<T: DeserializeOwned>(&self) -> Result<T, HomeAutoError> {
        let contents = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Read the document, or `None` when the file does not exist yet
    pub async fn read_optional<T: DeserializeOwned>(&self) -> Result<Option<T>, HomeAutoError> {
        if !self.exists().await {
            return Ok(None);
        }
        self.read().await.map(Some)
    }

    /// Write through a temporary file and rename over the target
    pub async fn write<T: Serialize>(&self, value: &T) -> Result<(), HomeAutoError> {
        self.write_with_mode(value, None).await
    }

    /// Like [`JsonFile::write`], but the document is readable by its owner
    /// only (0o600) from the moment it is created. Off Unix the mode is ignored.
    pub async fn write_private<T: Serialize>(&self, value: &T) -> Result<(), HomeAutoError> {
        self.write_with_mode(value, Some(0o600)).await
    }

    async fn write_with_mode<T: Serialize>(
        &self,
        value: &T,
        mode: Option<u32>,
    ) -> Result<(), HomeAutoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_vec_pretty(value)?;
        let temp_path = self.path.with_extension("tmp");

        // the mode only applies when the file is created
        match fs::remove_file(&temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        if let Some(mode) = mode {
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

/// Settings store writing one JSON file per action plus one for the gateway
pub struct FileSettingsStore {
    layout: StorageLayout,
}

impl FileSettingsStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub async fn load_global(&self) -> Result<Option<GlobalSettings>, HomeAutoError> {
        self.layout.global_settings_file().read_optional().await
    }

    pub async fn load_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceSettings>, HomeAutoError> {
        self.layout
            .instance_settings_file(instance_id)
            .read_optional()
            .await
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn persist_instance(
        &self,
        instance_id: &str,
        settings: &InstanceSettings,
    ) -> Result<(), HomeAutoError> {
        let file = self.layout.instance_settings_file(instance_id);
        debug!("Saving settings of '{}' to {}", instance_id, file.path().display());
        file.write(settings).await
    }

    async fn persist_global(
        &self,
        settings: &GlobalSettings,
        notify_others: bool,
    ) -> Result<(), HomeAutoError> {
        let file = self.layout.global_settings_file();
        debug!(
            "Saving global settings to {} (notify others: {})",
            file.path().display(),
            notify_others
        );
        file.write_private(settings).await
    }
}
