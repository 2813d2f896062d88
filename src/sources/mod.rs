//! Data sources feeding the query pipeline
//!
//! A [`DataSource`] hands out the raw text of one registry's delegation feed.
//! The [`collector::SourceCollector`] fetches and parses every configured
//! source concurrently.
//!
//! Implementations:
//!
//! | Source | Feature | Description |
//! |--------|---------|-------------|
//! | [`StaticSource`] | (always) | In-memory feed text |
//! | `RemoteSource` | `fetch` | Any `oneio` path (https, local, compressed) |
//! | `CachedSource` | `fetch` | `RemoteSource` behind a local file cache |

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncBufRead;

pub mod collector;
pub mod registry;

#[cfg(feature = "fetch")]
pub mod cached;
#[cfg(feature = "fetch")]
pub mod remote;

pub use collector::{RecordSetStream, SourceCollector};
pub use registry::{Registry, DEFAULT_MIRROR_URL};

#[cfg(feature = "fetch")]
pub use cached::{CacheMeta, CachedSource, DEFAULT_CACHE_TTL};
#[cfg(feature = "fetch")]
pub use remote::RemoteSource;

/// Byte stream of a delegation feed
pub type FeedReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// A provider of one registry's raw delegation feed
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Name of the source, used in logs and errors
    fn name(&self) -> &str;

    /// Retrieve the feed
    async fn fetch(&self) -> Result<FeedReader>;
}

/// Feed text held in memory
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    data: Vec<u8>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<FeedReader> {
        Ok(Box::new(std::io::Cursor::new(self.data.clone())))
    }
}
