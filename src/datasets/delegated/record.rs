//! Typed records of a delegation feed
//!
//! All types here are built once by the parser and only read afterwards, so
//! fields are private and exposed through accessors.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

// =============================================================================
// Family
// =============================================================================

/// Resource family of a delegation line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ipv4,
    Ipv6,
    Asn,
}

impl Family {
    /// Token used for this family in the feed
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ipv4 => "ipv4",
            Family::Ipv6 => "ipv6",
            Family::Asn => "asn",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(Family::Ipv4),
            "ipv6" => Ok(Family::Ipv6),
            "asn" => Ok(Family::Asn),
            other => Err(format!("unknown resource family '{}'", other)),
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

/// Fields shared by IP and ASN delegation lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    registry: String,
    country: String,
    family: Family,
    date: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    opaque_id: Option<String>,
}

impl Entry {
    pub(crate) fn new(
        registry: &str,
        country: &str,
        family: Family,
        date: &str,
        status: &str,
        opaque_id: Option<&str>,
    ) -> Self {
        Self {
            registry: registry.to_string(),
            country: country.to_string(),
            family,
            date: date.to_string(),
            status: status.to_string(),
            opaque_id: opaque_id.map(str::to_string),
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// ISO 3166 alpha-2 code, empty for unallocated space
    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Raw date token as found in the feed (`YYYYMMDD`)
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Allocation date, `None` for the empty or all-zero placeholders
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y%m%d").ok()
    }

    /// Allocation status, e.g. `allocated`, `assigned`, `available`
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Registry-internal identifier, only present on extended lines
    pub fn opaque_id(&self) -> Option<&str> {
        self.opaque_id.as_deref()
    }
}

/// Address range of an IP delegation as declared by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IpAllocation {
    /// IPv4 ranges are declared as a start address and a host count
    V4 { start: Ipv4Addr, count: u64 },
    /// IPv6 ranges are declared as a start address and a prefix length
    V6 { start: Ipv6Addr, prefix_len: u8 },
}

impl IpAllocation {
    pub fn start(&self) -> IpAddr {
        match self {
            IpAllocation::V4 { start, .. } => IpAddr::V4(*start),
            IpAllocation::V6 { start, .. } => IpAddr::V6(*start),
        }
    }
}

/// An `ipv4` or `ipv6` delegation line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpEntry {
    #[serde(flatten)]
    entry: Entry,
    allocation: IpAllocation,
}

impl IpEntry {
    pub(crate) fn new(entry: Entry, allocation: IpAllocation) -> Self {
        Self { entry, allocation }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn country(&self) -> &str {
        self.entry.country()
    }

    pub fn family(&self) -> Family {
        self.entry.family()
    }

    pub fn allocation(&self) -> &IpAllocation {
        &self.allocation
    }

    pub fn start(&self) -> IpAddr {
        self.allocation.start()
    }
}

/// An `asn` delegation line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsnEntry {
    #[serde(flatten)]
    entry: Entry,
    start: u32,
    count: u32,
}

impl AsnEntry {
    pub(crate) fn new(entry: Entry, start: u32, count: u32) -> Self {
        Self {
            entry,
            start,
            count,
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn country(&self) -> &str {
        self.entry.country()
    }

    /// First ASN of the block
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Number of consecutive ASNs in the block
    pub fn count(&self) -> u32 {
        self.count
    }
}

// =============================================================================
// Header and summary lines
// =============================================================================

/// The version line opening every feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionHeader {
    pub version: f64,
    pub registry: String,
    pub serial: String,
    /// Number of records the registry declares, excluding header and summaries
    pub records: u64,
    pub start_date: String,
    pub end_date: String,
    pub utc_offset: String,
}

/// A `registry|*|family|*|count|summary` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCount {
    pub registry: String,
    pub family: Family,
    pub count: u64,
}

/// Declared counts per family, last summary line wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub asn: Option<u64>,
    pub ipv4: Option<u64>,
    pub ipv6: Option<u64>,
}

impl SummaryCounts {
    pub(crate) fn record(&mut self, summary: &SummaryCount) {
        let slot = match summary.family {
            Family::Asn => &mut self.asn,
            Family::Ipv4 => &mut self.ipv4,
            Family::Ipv6 => &mut self.ipv6,
        };
        *slot = Some(summary.count);
    }

    pub fn get(&self, family: Family) -> Option<u64> {
        match family {
            Family::Asn => self.asn,
            Family::Ipv4 => self.ipv4,
            Family::Ipv6 => self.ipv6,
        }
    }
}

// =============================================================================
// RecordSet
// =============================================================================

/// Everything parsed from one source's feed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    source: String,
    version: Option<VersionHeader>,
    summary: SummaryCounts,
    ips: Vec<IpEntry>,
    asns: Vec<AsnEntry>,
    skipped: usize,
}

impl RecordSet {
    pub(crate) fn new(
        source: String,
        version: Option<VersionHeader>,
        summary: SummaryCounts,
        ips: Vec<IpEntry>,
        asns: Vec<AsnEntry>,
        skipped: usize,
    ) -> Self {
        Self {
            source,
            version,
            summary,
            ips,
            asns,
            skipped,
        }
    }

    /// Name of the data source this set was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn version(&self) -> Option<&VersionHeader> {
        self.version.as_ref()
    }

    /// Counts declared by the feed's summary lines
    pub fn summary(&self) -> &SummaryCounts {
        &self.summary
    }

    /// IP entries in feed order
    pub fn ips(&self) -> &[IpEntry] {
        &self.ips
    }

    /// ASN entries in feed order
    pub fn asns(&self) -> &[AsnEntry] {
        &self.asns
    }

    /// Entry lines dropped because their family was neither IP nor ASN
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Consume the set, keeping only the IP entries
    pub fn into_ips(self) -> Vec<IpEntry> {
        self.ips
    }
}
