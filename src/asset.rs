//! Asset loading
//!
//! Turns a resolved storage path into an in-memory payload plus the metadata
//! the delivery engine needs for its validators.

use crate::error::{Result, ServeError};
use async_trait::async_trait;
use hyper::body::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A loaded payload with its size and modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Bytes,
    pub size: u64,
    pub mtime: SystemTime,
}

impl Asset {
    pub fn new(bytes: impl Into<Bytes>, mtime: SystemTime) -> Self {
        let bytes = bytes.into();
        Self {
            size: bytes.len() as u64,
            bytes,
            mtime,
        }
    }

    /// Join assets in the given order.
    ///
    /// The result's size is the sum of the parts and its mtime the newest
    /// part's mtime. When two parts share the newest mtime either may win;
    /// the value is the same.
    pub fn concat(parts: &[Self]) -> Self {
        let total: usize = parts.iter().map(|a| a.bytes.len()).sum();
        let mut joined = Vec::with_capacity(total);
        for part in parts {
            joined.extend_from_slice(&part.bytes);
        }
        let mtime = parts
            .iter()
            .map(|a| a.mtime)
            .max()
            .unwrap_or(UNIX_EPOCH);
        Self::new(joined, mtime)
    }
}

/// Source of assets. Implementations must be non-blocking.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Stat and read `path`.
    ///
    /// A missing path or anything that is not a regular file is
    /// `ServeError::NotFound`; a read failure after a successful stat is
    /// `ServeError::Read`.
    async fn load(&self, path: &Path) -> Result<Asset>;
}

/// Loads assets from the local filesystem through `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

#[async_trait]
impl AssetLoader for FsLoader {
    async fn load(&self, path: &Path) -> Result<Asset> {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(ServeError::not_found(path)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "stat failed");
                return Err(ServeError::not_found(path));
            }
        };

        // The file may change between stat and read; that window is accepted.
        let bytes = tokio::fs::read(path).await.map_err(|source| ServeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mtime = meta.modified().unwrap_or(UNIX_EPOCH);
        Ok(Asset::new(bytes, mtime))
    }
}

/// Entry of a [`MemoryLoader`]
#[derive(Debug, Clone)]
struct MemoryEntry {
    asset: Asset,
    delay: Duration,
    fail_read: bool,
}

/// In-memory asset source.
///
/// Useful for embedding fixed payloads and for exercising the combo join:
/// each entry can be given an artificial latency so completion order can be
/// controlled, and can be marked to fail as a read error.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<PathBuf, MemoryEntry>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, asset: Asset) -> &mut Self {
        self.insert_delayed(path, asset, Duration::ZERO)
    }

    pub fn insert_delayed(
        &mut self,
        path: impl Into<PathBuf>,
        asset: Asset,
        delay: Duration,
    ) -> &mut Self {
        self.entries.insert(
            path.into(),
            MemoryEntry {
                asset,
                delay,
                fail_read: false,
            },
        );
        self
    }

    /// Register a path that stats fine but fails to read
    pub fn insert_unreadable(&mut self, path: impl Into<PathBuf>, delay: Duration) -> &mut Self {
        self.entries.insert(
            path.into(),
            MemoryEntry {
                asset: Asset::new(Bytes::new(), UNIX_EPOCH),
                delay,
                fail_read: true,
            },
        );
        self
    }
}

#[async_trait]
impl AssetLoader for MemoryLoader {
    async fn load(&self, path: &Path) -> Result<Asset> {
        let entry = self
            .entries
            .get(path)
            .ok_or_else(|| ServeError::not_found(path))?;
        if !entry.delay.is_zero() {
            tokio::time::sleep(entry.delay).await;
        }
        if entry.fail_read {
            return Err(ServeError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::other("simulated read failure"),
            });
        }
        Ok(entry.asset.clone())
    }
}
