//! Captured image persistence
//!
//! Files land in `<cache-root>[/<bundle-id>]/<product-namespace>/<UUID>.jpg`.
//! Each write goes through a temp file in the same directory and is renamed
//! into place without replacing an existing file. Nothing here deletes files.

use crate::config::StorageConfig;
use crate::errors::CameraError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;
use uuid::Uuid;

/// Where a captured image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    /// Percent-encoded `file://` URI of `path`
    pub uri: String,
    /// File name including extension
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    config: StorageConfig,
}

impl ImageStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn directory(&self) -> Result<PathBuf, CameraError> {
        self.config.capture_dir()
    }

    /// Write encoded JPEG bytes under a fresh unique name
    pub fn write(&self, data: &[u8]) -> Result<SavedImage, CameraError> {
        let dir = self.directory()?;
        fs::create_dir_all(&dir)?;

        let name = format!("{}.jpg", Uuid::new_v4().to_string().to_uppercase());
        let path = dir.join(&name);
        let uri = file_uri(&path)?;

        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        staged.persist_noclobber(&path).map_err(|e| e.error)?;

        log::debug!("Wrote {} bytes to {:?}", data.len(), path);
        Ok(SavedImage { uri, name, path })
    }
}

fn file_uri(path: &Path) -> Result<String, CameraError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map(|url| url.to_string())
        .map_err(|()| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file URI for {}", absolute.display()),
            )
            .into()
        })
}
