use crate::prelude::*;
use cardvault_core::record::CollectionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::CollectionStore;

/// Collections stored as one JSON document per user on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct CollectionDocumentRef<'a> {
    user_id: &'a str,
    saved_at: DateTime<Utc>,
    records: &'a [CollectionRecord],
}

#[derive(Debug, Deserialize)]
struct CollectionDocument {
    user_id: String,
    saved_at: DateTime<Utc>,
    records: Vec<CollectionRecord>,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory, e.g. `~/.local/share/cardvault`
    pub fn default_dir() -> Result<PathBuf, Error> {
        dirs_next::data_dir()
            .map(|dir| dir.join("cardvault"))
            .ok_or_else(|| Error::Config("Unable to determine data directory".to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a user, named by the MD5 of the user id so any id is a safe file name
    fn path_for(&self, user_id: &str) -> PathBuf {
        let hash = md5::compute(user_id.as_bytes());
        self.dir.join(format!("{:x}.json", hash))
    }
}

impl CollectionStore for LocalStore {
    async fn save(&self, user_id: &str, records: &[CollectionRecord]) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Store(format!(
                "Failed to create data directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let document = CollectionDocumentRef {
            user_id,
            saved_at: Utc::now(),
            records,
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| Error::Store(format!("Failed to serialize collection: {}", e)))?;

        // Write beside the target and rename so readers never see a partial file.
        let path = self.path_for(user_id);
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            Error::Store(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Error::Store(format!("Failed to replace {}: {}", path.display(), e)))?;

        log::debug!(
            "Saved {} records for {} to {}",
            records.len(),
            user_id,
            path.display()
        );

        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Option<Vec<CollectionRecord>>, Error> {
        let path = self.path_for(user_id);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let document: CollectionDocument = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Store(format!("Failed to parse {}: {}", path.display(), e)))?;

        if document.user_id != user_id {
            log::warn!(
                "Collection file {} belongs to {}, not {}",
                path.display(),
                document.user_id,
                user_id
            );
            return Ok(None);
        }

        log::debug!(
            "Loaded {} records for {} saved at {}",
            document.records.len(),
            user_id,
            document.saved_at.to_rfc3339()
        );

        Ok(Some(document.records))
    }
}
