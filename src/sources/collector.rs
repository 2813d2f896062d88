//! Concurrent fetch-and-parse across all configured sources
//!
//! [`SourceCollector::collect`] spawns one task per source. Each task fetches
//! its feed, parses it and sends the resulting [`RecordSet`] into a bounded
//! channel. The returned [`RecordSetStream`] yields record sets in completion
//! order and ends once every source has delivered.
//!
//! The stream owns the tasks: dropping it (e.g. after the consumer found what
//! it needed) cancels every producer still fetching, parsing, or waiting for
//! channel capacity.

use crate::datasets::{parse_reader, ParseError, RecordSet};
use crate::error::RirError;
use crate::sources::DataSource;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[cfg(feature = "fetch")]
use crate::config::RirConfig;
#[cfg(feature = "fetch")]
use crate::sources::{CachedSource, Registry, RemoteSource};

/// Runs the fetch/parse stage of every source concurrently
#[derive(Clone)]
pub struct SourceCollector {
    sources: Vec<Arc<dyn DataSource>>,
    capacity: usize,
}

impl SourceCollector {
    /// Create a collector over the given sources
    pub fn new(sources: Vec<Arc<dyn DataSource>>) -> Self {
        Self {
            sources,
            capacity: 0,
        }
    }

    /// Set the channel capacity (0 = one slot per source)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Collector for the given registries, optionally behind the file cache
    #[cfg(feature = "fetch")]
    pub fn from_registries(registries: &[Registry], config: &RirConfig, use_cache: bool) -> Self {
        let sources = registries
            .iter()
            .map(|registry| {
                let remote = RemoteSource::for_registry(*registry, &config.mirror_url);
                let source: Arc<dyn DataSource> = if use_cache {
                    Arc::new(CachedSource::new(
                        remote,
                        config.cache_dir(),
                        config.cache_ttl(),
                    ))
                } else {
                    Arc::new(remote)
                };
                source
            })
            .collect();

        Self::new(sources).with_capacity(config.channel_capacity)
    }

    /// Collector for the registries listed in the configuration
    #[cfg(feature = "fetch")]
    pub fn from_config(config: &RirConfig, use_cache: bool) -> anyhow::Result<Self> {
        let registries = config.registries()?;
        Ok(Self::from_registries(&registries, config, use_cache))
    }

    /// Names of the configured sources
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn channel_capacity(&self) -> usize {
        match self.capacity {
            0 => self.sources.len().max(1),
            n => n,
        }
    }

    /// Start fetching and parsing every source.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn collect(&self) -> RecordSetStream {
        let (tx, rx) = mpsc::channel(self.channel_capacity());
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for source in &self.sources {
            let source = Arc::clone(source);
            let tx = tx.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let name = source.name().to_string();
                debug!("start loading {}", name);

                let result = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("loading {} cancelled", name);
                        return;
                    }
                    result = load(source.as_ref()) => result,
                };

                if let Ok(records) = &result {
                    info!(
                        "loaded {}: {} ip entries, {} asn entries",
                        name,
                        records.ips().len(),
                        records.asns().len()
                    );
                }

                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("delivery of {} cancelled", name);
                    }
                    sent = tx.send(result) => {
                        if sent.is_err() {
                            debug!("receiver of {} records is gone", name);
                        }
                    }
                }
            });
        }

        RecordSetStream {
            rx,
            tasks,
            cancel,
            expected: self.sources.len(),
            delivered: 0,
            done: false,
        }
    }
}

/// Fetch and parse one source
async fn load(source: &dyn DataSource) -> Result<RecordSet, RirError> {
    let name = source.name();
    let reader = source
        .fetch()
        .await
        .map_err(|e| RirError::SourceUnavailable {
            source_name: name.to_string(),
            reason: format!("{:#}", e),
        })?;

    parse_reader(name, reader).await.map_err(|error| match error {
        ParseError::Io(e) => RirError::SourceUnavailable {
            source_name: name.to_string(),
            reason: e.to_string(),
        },
        error => RirError::Parse {
            source_name: name.to_string(),
            error,
        },
    })
}

/// Record sets of all sources, in completion order
///
/// Yields at most one error, after which the remaining producers are
/// cancelled and the stream ends.
pub struct RecordSetStream {
    rx: mpsc::Receiver<Result<RecordSet, RirError>>,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    expected: usize,
    delivered: usize,
    done: bool,
}

impl RecordSetStream {
    /// Number of sources feeding this stream
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Stop all producers; no further items are yielded
    pub fn cancel(&mut self) {
        self.done = true;
        self.cancel.cancel();
        self.rx.close();
        self.tasks.abort_all();
    }
}

impl Stream for RecordSetStream {
    type Item = Result<RecordSet, RirError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.done {
            return Poll::Ready(None);
        }

        match ready!(this.rx.poll_recv(cx)) {
            Some(Ok(records)) => {
                this.delivered += 1;
                Poll::Ready(Some(Ok(records)))
            }
            Some(Err(e)) => {
                this.cancel();
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.done = true;
                if this.delivered < this.expected {
                    // a producer ended without sending, e.g. it panicked
                    Poll::Ready(Some(Err(RirError::Incomplete {
                        expected: this.expected,
                        delivered: this.delivered,
                    })))
                } else {
                    Poll::Ready(None)
                }
            }
        }
    }
}

impl Drop for RecordSetStream {
    fn drop(&mut self) {
        // the JoinSet aborts its tasks on drop as well
        self.cancel.cancel();
    }
}
