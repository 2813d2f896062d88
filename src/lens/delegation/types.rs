//! Delegation lens output types

use crate::datasets::{RecordSet, SummaryCounts, VersionHeader};
use ipnet::IpNet;
use num_bigint::BigUint;
use serde::Serialize;
use std::fmt;

/// A delegated prefix with the country it is registered to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CountryPrefix {
    /// ISO 3166 alpha-2 code as published by the registry
    pub country: String,
    pub prefix: IpNet,
}

impl CountryPrefix {
    pub fn new(country: impl Into<String>, prefix: IpNet) -> Self {
        Self {
            country: country.into(),
            prefix,
        }
    }
}

impl fmt::Display for CountryPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.country, self.prefix)
    }
}

/// Usable host addresses of a prefix.
///
/// IPv4 prefixes with at least two host bits lose their network and broadcast
/// addresses; `/31` and `/32` count in full. IPv6 prefixes always count in full.
pub fn usable_hosts(prefix: &IpNet) -> BigUint {
    let host_bits = usize::from(prefix.max_prefix_len() - prefix.prefix_len());
    let total = BigUint::from(1u8) << host_bits;
    match prefix {
        IpNet::V4(_) if host_bits >= 2 => total - 2u32,
        _ => total,
    }
}

/// Usable host addresses summed per address family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostCounts {
    pub v4: BigUint,
    pub v6: BigUint,
}

impl HostCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one prefix
    pub fn add(&mut self, prefix: &IpNet) {
        let hosts = usable_hosts(prefix);
        match prefix {
            IpNet::V4(_) => self.v4 += hosts,
            IpNet::V6(_) => self.v6 += hosts,
        }
    }
}

impl<'a> Extend<&'a IpNet> for HostCounts {
    fn extend<I: IntoIterator<Item = &'a IpNet>>(&mut self, iter: I) {
        for prefix in iter {
            self.add(prefix);
        }
    }
}

impl fmt::Display for HostCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v4: {}\nv6: {}", self.v4, self.v6)
    }
}

/// Bookkeeping of one parsed source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    /// Version header of the feed, if it had one
    pub version: Option<VersionHeader>,
    /// Counts declared by the feed's summary lines
    pub declared: SummaryCounts,
    pub ipv4_entries: usize,
    pub ipv6_entries: usize,
    pub asn_entries: usize,
    /// Entry lines dropped for an unsupported resource family
    pub skipped: usize,
}

impl From<&RecordSet> for SourceSummary {
    fn from(records: &RecordSet) -> Self {
        let ipv4_entries = records
            .ips()
            .iter()
            .filter(|e| e.family() == crate::datasets::Family::Ipv4)
            .count();
        Self {
            source: records.source().to_string(),
            version: records.version().cloned(),
            declared: records.summary().clone(),
            ipv4_entries,
            ipv6_entries: records.ips().len() - ipv4_entries,
            asn_entries: records.asns().len(),
            skipped: records.skipped(),
        }
    }
}

impl fmt::Display for SourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn declared(count: Option<u64>) -> String {
            count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        writeln!(f, "{}", self.source)?;
        if let Some(version) = &self.version {
            writeln!(
                f,
                "  Serial:     {} (version {}, {} records)",
                version.serial, version.version, version.records
            )?;
            writeln!(
                f,
                "  Period:     {} - {}",
                version.start_date, version.end_date
            )?;
        }
        writeln!(
            f,
            "  IPv4:       {} parsed, {} declared",
            self.ipv4_entries,
            declared(self.declared.ipv4)
        )?;
        writeln!(
            f,
            "  IPv6:       {} parsed, {} declared",
            self.ipv6_entries,
            declared(self.declared.ipv6)
        )?;
        writeln!(
            f,
            "  ASN:        {} parsed, {} declared",
            self.asn_entries,
            declared(self.declared.asn)
        )?;
        write!(f, "  Skipped:    {}", self.skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::parse_str;

    fn hosts(prefix: &str) -> BigUint {
        usable_hosts(&prefix.parse().unwrap())
    }

    #[test]
    fn test_usable_hosts_v4() {
        assert_eq!(hosts("1.2.3.0/24"), BigUint::from(254u32));
        assert_eq!(hosts("1.2.3.0/30"), BigUint::from(2u32));
        assert_eq!(hosts("1.2.3.0/31"), BigUint::from(2u32));
        assert_eq!(hosts("1.2.3.4/32"), BigUint::from(1u32));
        assert_eq!(hosts("0.0.0.0/0"), BigUint::from(u32::MAX - 1));
    }

    #[test]
    fn test_usable_hosts_v6() {
        assert_eq!(hosts("2001:db8::/127"), BigUint::from(2u32));
        assert_eq!(hosts("2001:db8::/128"), BigUint::from(1u32));
        assert_eq!(hosts("2001:db8::/32"), BigUint::from(1u128 << 96));
        assert_eq!(hosts("::/0"), BigUint::from(u128::MAX) + 1u32);
    }

    #[test]
    fn test_host_counts() {
        let prefixes: Vec<IpNet> = ["1.2.3.0/24", "1.2.4.0/31", "1.2.5.1/32", "2001:db8::/48"]
            .iter()
            .map(|p| p.parse().unwrap())
            .collect();

        let mut counts = HostCounts::new();
        counts.extend(&prefixes);
        assert_eq!(counts.v4, BigUint::from(257u32));
        assert_eq!(counts.v6, BigUint::from(1u128 << 80));
        assert_eq!(
            counts.to_string(),
            format!("v4: 257\nv6: {}", 1u128 << 80)
        );
        assert_eq!(HostCounts::new().to_string(), "v4: 0\nv6: 0");
    }

    #[test]
    fn test_country_prefix_display() {
        let item = CountryPrefix::new("FR", "1.2.3.0/24".parse().unwrap());
        assert_eq!(item.to_string(), "FR\t1.2.3.0/24");
    }

    #[test]
    fn test_source_summary() {
        let records = parse_str(
            "test",
            "2|test|20240101|3|19830101|20240101|+0000\n\
             test|*|ipv4|*|2|summary\n\
             test|FR|ipv4|1.2.3.0|256|20100101|allocated\n\
             test|DE|ipv4|5.6.7.0|256|20100101|allocated\n\
             test|FR|ipv6|2001:db8::|32|20100101|allocated\n\
             test|FR|asn|64512|1|20100101|allocated\n\
             test|FR|ipx|1|1|20100101|allocated\n",
        )
        .unwrap();

        let summary = SourceSummary::from(&records);
        assert_eq!(summary.source, "test");
        assert_eq!(summary.ipv4_entries, 2);
        assert_eq!(summary.ipv6_entries, 1);
        assert_eq!(summary.asn_entries, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.declared.ipv4, Some(2));
        assert_eq!(summary.declared.ipv6, None);

        let text = summary.to_string();
        assert!(text.starts_with("test\n"));
        assert!(text.contains("IPv4:       2 parsed, 2 declared"));
        assert!(text.contains("IPv6:       1 parsed, - declared"));
    }
}
