#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! rir - query regional internet registry delegation data
//!
//! The five regional internet registries (AFRINIC, APNIC, ARIN, LACNIC and
//! RIPE NCC) publish daily "delegated-extended" statistics listing every IPv4,
//! IPv6 and ASN block they hand out, with the country it is registered to.
//! This crate fetches those feeds concurrently, parses them into typed records
//! and answers questions such as "which prefixes are delegated to FR?",
//! "who holds 1.2.3.10?" or "how many addresses does NL hold?".
//!
//! It can be used as both a command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Parser, decomposition, collector and lens over any [`DataSource`] | `tokio`, `ipnet`, `num-bigint` |
//! | `fetch` | Remote feeds and the on-disk cache | `oneio`, `md-5` |
//! | `cli` | The `rir` binary | All above + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Parse feeds you obtain yourself
//! rir = { version = "0.1", default-features = false }
//!
//! # Fetch from the registries, no CLI
//! rir = { version = "0.1", default-features = false, features = ["fetch"] }
//! ```
//!
//! # Architecture
//!
//! - **[`datasets`]**: the delegation feed format
//!   - `parser`: line classification and decoding into a [`RecordSet`]
//!   - `prefix`: splitting IPv4 ranges into aligned CIDR blocks
//! - **[`sources`]**: where feeds come from and the concurrent [`SourceCollector`]
//! - **[`lens`]**: queries over the collected record sets ([`DelegationLens`])
//! - **[`config`]**: configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use rir::lens::delegation::{DelegationLens, IpLookupArgs};
//! use rir::{RirConfig, SourceCollector};
//!
//! let config = RirConfig::new(&None)?;
//! let lens = DelegationLens::new(SourceCollector::from_config(&config, true)?);
//!
//! let mut matches = lens.lookup_ip(&IpLookupArgs::new("1.2.3.10"))?;
//! while let Some(item) = matches.next().await {
//!     println!("{}", item?); // e.g. "FR\t1.2.3.0/24"
//! }
//! ```
//!
//! Feeds held in memory work the same way:
//!
//! ```rust,ignore
//! use rir::sources::{DataSource, StaticSource};
//! use std::sync::Arc;
//!
//! let source: Arc<dyn DataSource> = Arc::new(StaticSource::new("test", feed_text));
//! let lens = DelegationLens::new(SourceCollector::new(vec![source]));
//! let counts = lens.host_counts(&CountryQueryArgs::new("FR")).await?;
//! println!("{}", counts); // "v4: ...\nv6: ..."
//! ```

pub mod config;
pub mod datasets;
pub mod error;
pub mod lens;
pub mod sources;

// =============================================================================
// Configuration
// =============================================================================

pub use config::RirConfig;

// =============================================================================
// Errors
// =============================================================================

pub use datasets::ParseError;
pub use error::RirError;

// =============================================================================
// Delegation data
// =============================================================================

pub use datasets::{
    decompose_v4, parse_reader, parse_str, AsnEntry, Entry, Family, IpAllocation, IpEntry,
    RecordParser, RecordSet, SummaryCounts, VersionHeader,
};

// =============================================================================
// Sources
// =============================================================================

pub use sources::{
    DataSource, FeedReader, RecordSetStream, Registry, SourceCollector, StaticSource,
};

#[cfg(feature = "fetch")]
pub use sources::{CachedSource, RemoteSource};

// =============================================================================
// Lenses
// =============================================================================

pub use lens::delegation::{
    CountryPrefix, CountryQueryArgs, DelegationLens, HostCounts, IpLookupArgs, SourceSummary,
};
