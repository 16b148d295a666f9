//! JSON file store.
//!
//! All records live in one pretty-printed array:
//!
//! ```text
//! store_path/
//! └── solicitations.json
//! ```
//!
//! Every batch rewrites the file through a sibling temporary file and a
//! rename, so a crash mid-write leaves the previous contents intact.

use super::{Persistence, upsert};
use crate::error::StoreError;
use crate::models::ComicBook;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

/// File name used when the store is opened on a directory.
pub const DEFAULT_FILE_NAME: &str = "solicitations.json";

#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Open a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Open `dir/solicitations.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<ComicBook>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Persistence for JsonStore {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = comics.len()))]
    async fn bulk_save(&self, comics: &[ComicBook]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read().await?;
        upsert(&mut records, comics);
        let json = serde_json::to_string_pretty(&records)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir).await {
                error!(dir = %dir.display(), error = %e, "Failed to create store dir");
                return Err(e.into());
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;

        info!(total = records.len(), "Wrote solicitation store");
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ComicBook>, StoreError> {
        let records = self.read().await?;
        debug!(path = %self.path.display(), count = records.len(), "Read solicitation store");
        Ok(records)
    }
}
