// crates/store/src/persist.rs
//! Versioned JSON state blobs.
//!
//! One blob per state kind, addressed by a stable scope key so several
//! engines (e.g. an "inbox" view and a "requests" view) can coexist in the
//! same directory: `<dir>/<scope>.cache.json` and `<dir>/<scope>.usage.json`.
//!
//! Loading is forgiving: a missing, undecodable, or version-mismatched blob
//! degrades to the empty state with a warning — stale local state is never
//! worth failing startup over. Writes go through a temp file and rename so
//! a crash mid-write cannot leave a truncated blob behind.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use convo_view_core::PersistError;

use crate::cache::CacheState;
use crate::usage::UsageState;

/// Bump when the cache blob layout changes; older blobs are discarded.
pub const CACHE_BLOB_VERSION: u32 = 1;
/// Bump when the usage blob layout changes.
pub const USAGE_BLOB_VERSION: u32 = 1;

#[derive(Serialize)]
struct BlobRef<'a, T: Serialize> {
    version: u32,
    state: &'a T,
}

#[derive(Deserialize)]
struct Blob<T> {
    version: u32,
    state: T,
}

/// Reads and writes the two state blobs for one scope.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    scope: String,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>, scope: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            scope: scope.into(),
        }
    }

    /// Platform data directory for convo-view state, with a relative
    /// fallback when the platform reports no home.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("convo-view"))
            .unwrap_or_else(|| PathBuf::from(".convo-view"))
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.join(format!("{}.cache.json", self.scope))
    }

    pub fn usage_path(&self) -> PathBuf {
        self.dir.join(format!("{}.usage.json", self.scope))
    }

    pub async fn load_cache(&self) -> CacheState {
        self.load(&self.cache_path(), CACHE_BLOB_VERSION).await
    }

    pub async fn save_cache(&self, state: &CacheState) -> Result<(), PersistError> {
        self.save(&self.cache_path(), CACHE_BLOB_VERSION, state).await
    }

    pub async fn load_usage(&self) -> UsageState {
        self.load(&self.usage_path(), USAGE_BLOB_VERSION).await
    }

    pub async fn save_usage(&self, state: &UsageState) -> Result<(), PersistError> {
        self.save(&self.usage_path(), USAGE_BLOB_VERSION, state).await
    }

    async fn load<T: DeserializeOwned + Default>(&self, path: &Path, version: u32) -> T {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read state blob, starting empty");
                return T::default();
            }
        };

        match serde_json::from_slice::<Blob<T>>(&bytes) {
            Ok(blob) if blob.version == version => blob.state,
            Ok(blob) => {
                warn!(
                    path = %path.display(),
                    found = blob.version,
                    expected = version,
                    "state blob version mismatch, starting empty"
                );
                T::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "undecodable state blob, starting empty");
                T::default()
            }
        }
    }

    async fn save<T: Serialize>(
        &self,
        path: &Path,
        version: u32,
        state: &T,
    ) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PersistError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let bytes = serde_json::to_vec(&BlobRef { version, state }).map_err(|source| {
            PersistError::Encode {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| PersistError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| PersistError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}
