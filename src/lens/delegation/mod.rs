//! Delegation lens
//!
//! Queries over the delegation feeds of all configured registries:
//! - every delegated prefix with its country ([`DelegationLens::all_records`])
//! - prefixes delegated to a country ([`DelegationLens::country_prefixes`])
//! - prefixes containing an address ([`DelegationLens::lookup_ip`])
//! - usable host counts of a country ([`DelegationLens::host_counts`])
//! - per-registry bookkeeping ([`DelegationLens::summaries`])
//!
//! Streaming queries start fetching when called and stop all fetches when the
//! returned stream is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use rir::lens::delegation::{CountryQueryArgs, DelegationLens};
//! use rir::{RirConfig, SourceCollector};
//!
//! let config = RirConfig::new(&None)?;
//! let lens = DelegationLens::new(SourceCollector::from_config(&config, true)?);
//!
//! let mut prefixes = lens.country_prefixes(&CountryQueryArgs::new("FR"))?;
//! while let Some(prefix) = prefixes.next().await {
//!     println!("{}", prefix?);
//! }
//! ```

pub mod args;
pub mod types;

pub use args::{CountryQueryArgs, IpLookupArgs};
pub use types::{usable_hosts, CountryPrefix, HostCounts, SourceSummary};

use crate::error::RirError;
use crate::sources::SourceCollector;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::debug;

// =============================================================================
// Lens
// =============================================================================

/// Query facade over a [`SourceCollector`]
#[derive(Clone)]
pub struct DelegationLens {
    collector: SourceCollector,
}

impl DelegationLens {
    pub fn new(collector: SourceCollector) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &SourceCollector {
        &self.collector
    }

    /// Every delegated prefix with its country code.
    ///
    /// Entries without a country code (reserved or available space) are left out.
    pub fn all_records(&self) -> BoxStream<'static, Result<CountryPrefix, RirError>> {
        self.collector
            .collect()
            .map_ok(|records| {
                let prefixes = records
                    .into_ips()
                    .into_iter()
                    .filter(|entry| !entry.country().is_empty())
                    .flat_map(|entry| {
                        let country = entry.country().to_string();
                        entry.prefixes().map(move |prefix| {
                            Ok::<_, RirError>(CountryPrefix::new(country.clone(), prefix))
                        })
                    });
                stream::iter(prefixes)
            })
            .try_flatten()
            .boxed()
    }

    /// Prefixes delegated to a country, IPv4 ranges split into CIDR blocks
    pub fn country_prefixes(
        &self,
        args: &CountryQueryArgs,
    ) -> Result<BoxStream<'static, Result<IpNet, RirError>>, RirError> {
        args.validate().map_err(RirError::InvalidQuery)?;
        let country = args.normalized_country();
        debug!("querying prefixes of {}", country);

        let prefixes = self
            .collector
            .collect()
            .map_ok(move |records| {
                let country = country.clone();
                let prefixes = records
                    .into_ips()
                    .into_iter()
                    .filter(move |entry| entry.country().eq_ignore_ascii_case(&country))
                    .flat_map(|entry| entry.prefixes().map(Ok::<IpNet, RirError>));
                stream::iter(prefixes)
            })
            .try_flatten();

        Ok(limited(prefixes, args.limit))
    }

    /// Delegated prefixes containing an address, with their country codes.
    ///
    /// Every matching entry is reported, including overlapping entries of
    /// different registries. An unparsable address fails before any source is
    /// fetched.
    pub fn lookup_ip(
        &self,
        args: &IpLookupArgs,
    ) -> Result<BoxStream<'static, Result<CountryPrefix, RirError>>, RirError> {
        let input = args.ip.trim();
        let addr: IpAddr = input
            .parse()
            .map_err(|e: std::net::AddrParseError| RirError::UnparsableQueryAddress {
                input: input.to_string(),
                reason: e.to_string(),
            })?;
        debug!("looking up delegations containing {}", addr);

        let matches = self
            .collector
            .collect()
            .map_ok(move |records| {
                let matches = records
                    .into_ips()
                    .into_iter()
                    .filter(move |entry| entry.start().is_ipv4() == addr.is_ipv4())
                    .flat_map(move |entry| {
                        let country = entry.country().to_string();
                        entry
                            .prefixes()
                            .filter(move |prefix| prefix.contains(&addr))
                            .map(move |prefix| {
                                Ok::<_, RirError>(CountryPrefix::new(country.clone(), prefix))
                            })
                    });
                stream::iter(matches)
            })
            .try_flatten();

        Ok(limited(matches, args.limit))
    }

    /// Usable host addresses delegated to a country, per address family
    pub async fn host_counts(&self, args: &CountryQueryArgs) -> Result<HostCounts, RirError> {
        // counting covers every prefix regardless of any listing limit
        let args = CountryQueryArgs {
            limit: None,
            ..args.clone()
        };

        self.country_prefixes(&args)?
            .try_fold(HostCounts::new(), |mut counts, prefix| async move {
                counts.add(&prefix);
                Ok(counts)
            })
            .await
    }

    /// Bookkeeping of every source, ordered by source name
    pub async fn summaries(&self) -> Result<Vec<SourceSummary>, RirError> {
        let mut summaries: Vec<SourceSummary> = self
            .collector
            .collect()
            .map_ok(|records| SourceSummary::from(&records))
            .try_collect()
            .await?;
        summaries.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(summaries)
    }
}

fn limited<S, T>(stream: S, limit: Option<usize>) -> BoxStream<'static, T>
where
    S: futures::Stream<Item = T> + Send + 'static,
{
    match limit {
        Some(n) => stream.take(n).boxed(),
        None => stream.boxed(),
    }
}

// =============================================================================
// Tests
// =============================================================================
