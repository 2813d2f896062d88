//! Local file cache in front of a [`RemoteSource`]
//!
//! Each source keeps two files under `{cache_dir}/{name}/`:
//!
//! - `latest`: the raw feed text, exactly as downloaded
//! - `latest.meta.json`: a [`CacheMeta`] describing it
//!
//! A cached feed younger than the TTL is served as is. Once it expires, the
//! MD5 checksum the registry publishes next to the feed is compared with the
//! one recorded at download time, and the feed is only downloaded again when
//! they differ (or when the checksum cannot be obtained).

use crate::sources::{DataSource, FeedReader, RemoteSource};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default freshness window of a cached feed (24 hours)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Metadata stored next to a cached feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    /// Source name
    pub source: String,
    /// Where the feed was downloaded from
    pub url: String,
    /// When the feed was downloaded
    pub cached_at: DateTime<Utc>,
    /// When the feed was last confirmed current
    pub checked_at: DateTime<Utc>,
    /// MD5 of the cached bytes (lowercase hex)
    pub md5: String,
    /// Size of the cached feed in bytes
    pub size: u64,
}

/// A [`RemoteSource`] whose feed is cached on disk
#[derive(Debug, Clone)]
pub struct CachedSource {
    remote: RemoteSource,
    dir: PathBuf,
    ttl: Duration,
}

impl CachedSource {
    /// Cache the remote feed under `{cache_root}/{name}/`
    pub fn new(remote: RemoteSource, cache_root: impl AsRef<Path>, ttl: Duration) -> Self {
        let dir = cache_root.as_ref().join(remote.name());
        Self { remote, dir, ttl }
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.join("latest")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join("latest.meta.json")
    }

    /// Metadata of the cached feed, `None` if nothing usable is cached
    pub async fn load_meta(&self) -> Option<CacheMeta> {
        let content = tokio::fs::read_to_string(self.meta_path()).await.ok()?;
        let meta: CacheMeta = serde_json::from_str(&content).ok()?;
        let data = tokio::fs::metadata(self.data_path()).await.ok()?;
        (meta.size > 0 && data.len() == meta.size).then_some(meta)
    }

    /// Whether the cached feed was confirmed current within the TTL
    pub fn is_fresh(&self, meta: &CacheMeta) -> bool {
        let age = Utc::now().signed_duration_since(meta.checked_at);
        age.num_seconds() < self.ttl.as_secs() as i64
    }

    /// Compare the cached checksum with the one published by the registry
    async fn is_stale(&self, meta: &CacheMeta) -> bool {
        match self.remote.remote_md5().await {
            Ok(remote) => remote != meta.md5,
            Err(e) => {
                warn!("Cannot get md5 for {}: {:#}", self.remote.name(), e);
                true
            }
        }
    }

    /// Download the feed and replace the cached copy
    pub async fn refresh(&self) -> Result<Vec<u8>> {
        info!("Refreshing {} data", self.remote.name());
        let bytes = self.remote.download().await?;
        if bytes.is_empty() {
            return Err(anyhow!("{} returned an empty feed", self.remote.url()));
        }

        let now = Utc::now();
        let meta = CacheMeta {
            source: self.remote.name().to_string(),
            url: self.remote.url().to_string(),
            cached_at: now,
            checked_at: now,
            md5: format!("{:x}", Md5::digest(&bytes)),
            size: bytes.len() as u64,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| anyhow!("Failed to create cache directory {:?}: {}", self.dir, e))?;
        tokio::fs::write(self.data_path(), &bytes)
            .await
            .map_err(|e| anyhow!("Failed to write cache file {:?}: {}", self.data_path(), e))?;
        self.store_meta(&meta).await?;

        info!(
            "Cached {} bytes of {} data to {:?}",
            meta.size,
            meta.source,
            self.data_path()
        );
        Ok(bytes)
    }

    async fn store_meta(&self, meta: &CacheMeta) -> Result<()> {
        let content = serde_json::to_string_pretty(meta)
            .map_err(|e| anyhow!("Failed to serialize cache metadata: {}", e))?;
        tokio::fs::write(self.meta_path(), content)
            .await
            .map_err(|e| anyhow!("Failed to write cache metadata {:?}: {}", self.meta_path(), e))
    }

    async fn open_cached(&self) -> Result<FeedReader> {
        let file = tokio::fs::File::open(self.data_path())
            .await
            .map_err(|e| anyhow!("Failed to open cache file {:?}: {}", self.data_path(), e))?;
        Ok(Box::new(tokio::io::BufReader::new(file)))
    }
}

#[async_trait]
impl DataSource for CachedSource {
    fn name(&self) -> &str {
        self.remote.name()
    }

    async fn fetch(&self) -> Result<FeedReader> {
        if let Some(mut meta) = self.load_meta().await {
            if self.is_fresh(&meta) {
                info!("Using cached {} data from {}", meta.source, meta.cached_at);
                return self.open_cached().await;
            }
            if !self.is_stale(&meta).await {
                info!("Cached {} data is still current", meta.source);
                meta.checked_at = Utc::now();
                self.store_meta(&meta).await?;
                return self.open_cached().await;
            }
        }

        let bytes = self.refresh().await?;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }
}
