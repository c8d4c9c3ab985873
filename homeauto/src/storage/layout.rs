//! On-disk layout of the reference host's state directory

use std::path::PathBuf;

use crate::storage::file::JsonFile;

/// Storage layout rooted at the state directory
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Credentials and session token
    pub fn global_settings_file(&self) -> JsonFile {
        JsonFile::new(self.base_dir.join("global.json"))
    }

    /// Settings of one action instance
    pub fn instance_settings_file(&self, instance_id: &str) -> JsonFile {
        let file_name: String = instance_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        JsonFile::new(self.base_dir.join("actions").join(format!("{}.json", file_name)))
    }
}
