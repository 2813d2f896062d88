//! Line-oriented parser for RIR delegation feeds
//!
//! A feed is a sequence of pipe-delimited lines:
//!
//! ```text
//! 2|ripencc|1700000000|4|19830705|20231113|+0100
//! ripencc|*|ipv4|*|2|summary
//! ripencc|FR|ipv4|2.0.0.0|1048576|20100712|allocated|a1b2c3
//! ripencc|NL|asn|1101|1|19930901|allocated|d4e5f6
//! ```
//!
//! Each line is classified by [`classify`] and decoded into the typed records
//! of [`crate::datasets::delegated::record`].

use crate::datasets::delegated::error::ParseError;
use crate::datasets::delegated::record::{
    AsnEntry, Entry, Family, IpAllocation, IpEntry, RecordSet, SummaryCount, SummaryCounts,
    VersionHeader,
};
use crate::datasets::delegated::prefix::IPV4_SPACE;
use std::net::IpAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const ENTRY_FIELDS: usize = 7;
const VERSION_FIELDS: usize = 7;
const SUMMARY_FIELDS: usize = 6;

/// Kind of a single feed line, in classification precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Blank lines and `#` comments
    Ignored,
    Version,
    Summary,
    Ip,
    Asn,
    /// An entry whose family token is neither `ipv*` nor `asn`
    Unsupported,
}

/// Classify one feed line.
pub fn classify(line: &str) -> LineKind {
    if line.starts_with('#') || line.trim().is_empty() {
        return LineKind::Ignored;
    }
    if line.starts_with(|c: char| c.is_ascii_digit()) {
        return LineKind::Version;
    }
    if line.ends_with("summary") {
        return LineKind::Summary;
    }
    match line.split('|').nth(2) {
        Some(family) if family.starts_with("ipv") => LineKind::Ip,
        Some("asn") => LineKind::Asn,
        _ => LineKind::Unsupported,
    }
}

/// Incremental parser building a [`RecordSet`] one line at a time
#[derive(Debug, Default)]
pub struct RecordParser {
    source: String,
    line_no: usize,
    version: Option<VersionHeader>,
    summary: SummaryCounts,
    ips: Vec<IpEntry>,
    asns: Vec<AsnEntry>,
    skipped: usize,
}

impl RecordParser {
    /// Create a parser for the feed of the named source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Classify and decode the next line of the feed
    pub fn push_line(&mut self, line: &str) -> Result<(), ParseError> {
        self.line_no += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        match classify(line) {
            LineKind::Ignored => {}
            LineKind::Version => {
                self.version = Some(self.parse_version(line)?);
            }
            LineKind::Summary => {
                if let Some(summary) = self.parse_summary(line)? {
                    self.summary.record(&summary);
                }
            }
            LineKind::Ip => {
                let entry = self.parse_ip(line)?;
                self.ips.push(entry);
            }
            LineKind::Asn => {
                let entry = self.parse_asn(line)?;
                self.asns.push(entry);
            }
            LineKind::Unsupported => {
                debug!(
                    "{}: skipping line {} with unsupported family: {}",
                    self.source, self.line_no, line
                );
                self.skipped += 1;
            }
        }
        Ok(())
    }

    /// Finish parsing and hand out the collected records
    pub fn finish(self) -> RecordSet {
        RecordSet::new(
            self.source,
            self.version,
            self.summary,
            self.ips,
            self.asns,
            self.skipped,
        )
    }

    fn fields<'a>(&self, line: &'a str, expected: usize) -> Result<Vec<&'a str>, ParseError> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < expected {
            return Err(ParseError::MissingField {
                line: self.line_no,
                expected,
                found: fields.len(),
            });
        }
        Ok(fields)
    }

    fn number<T>(&self, field: &'static str, value: &str) -> Result<T, ParseError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .parse::<T>()
            .map_err(|e| ParseError::malformed(self.line_no, field, value, e))
    }

    fn parse_version(&self, line: &str) -> Result<VersionHeader, ParseError> {
        let f = self.fields(line, VERSION_FIELDS)?;
        Ok(VersionHeader {
            version: self.number("version", f[0])?,
            registry: f[1].to_string(),
            serial: f[2].to_string(),
            records: self.number("record count", f[3])?,
            start_date: f[4].to_string(),
            end_date: f[5].to_string(),
            utc_offset: f[6].to_string(),
        })
    }

    fn parse_summary(&self, line: &str) -> Result<Option<SummaryCount>, ParseError> {
        let f = self.fields(line, SUMMARY_FIELDS)?;
        let count = self.number("summary count", f[4])?;
        match f[2].parse::<Family>() {
            Ok(family) => Ok(Some(SummaryCount {
                registry: f[0].to_string(),
                family,
                count,
            })),
            Err(_) => {
                debug!(
                    "{}: ignoring summary for unknown family '{}' on line {}",
                    self.source, f[2], self.line_no
                );
                Ok(None)
            }
        }
    }

    fn build_entry(&self, f: &[&str], family: Family) -> Entry {
        Entry::new(f[0], f[1], family, f[5], f[6], f.get(7).copied())
    }

    fn parse_ip(&self, line: &str) -> Result<IpEntry, ParseError> {
        let f = self.fields(line, ENTRY_FIELDS)?;
        let family = f[2]
            .parse::<Family>()
            .map_err(|e| ParseError::malformed(self.line_no, "family", f[2], e))?;
        let start: IpAddr = self.number("start address", f[3])?;

        let allocation = match (family, start) {
            (Family::Ipv4, IpAddr::V4(start)) => {
                let count: u64 = self.number("host count", f[4])?;
                if u64::from(u32::from(start)) + count > IPV4_SPACE {
                    return Err(ParseError::malformed(
                        self.line_no,
                        "host count",
                        f[4],
                        format!("range starting at {} exceeds the IPv4 space", start),
                    ));
                }
                IpAllocation::V4 { start, count }
            }
            (Family::Ipv6, IpAddr::V6(start)) => {
                let prefix_len: u8 = self.number("prefix length", f[4])?;
                if prefix_len > 128 {
                    return Err(ParseError::malformed(
                        self.line_no,
                        "prefix length",
                        f[4],
                        "longer than 128 bits",
                    ));
                }
                IpAllocation::V6 { start, prefix_len }
            }
            (family, _) => {
                return Err(ParseError::malformed(
                    self.line_no,
                    "start address",
                    f[3],
                    format!("not an {} address", family),
                ))
            }
        };

        Ok(IpEntry::new(self.build_entry(&f, family), allocation))
    }

    fn parse_asn(&self, line: &str) -> Result<AsnEntry, ParseError> {
        let f = self.fields(line, ENTRY_FIELDS)?;
        let start = self.number("ASN", f[3])?;
        let count = self.number("ASN count", f[4])?;
        Ok(AsnEntry::new(self.build_entry(&f, Family::Asn), start, count))
    }
}

/// Parse a complete in-memory feed
pub fn parse_str(source: &str, text: &str) -> Result<RecordSet, ParseError> {
    let mut parser = RecordParser::new(source);
    for line in text.lines() {
        parser.push_line(line)?;
    }
    Ok(parser.finish())
}

/// Parse a feed from an async reader, line by line
pub async fn parse_reader<R>(source: &str, reader: R) -> Result<RecordSet, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = RecordParser::new(source);
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        parser.push_line(&line)?;
    }
    Ok(parser.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const FEED: &str = "\
# delegated-test-extended
2.3|test|20240101|6|19830101|20240101|+0000
test|*|asn|*|3|summary
test|*|ipv4|*|5|summary
test|*|ipv6|*|1|summary
test|FR|ipv4|1.2.3.0|256|20100101|allocated|A1
test|DE|ipv4|5.6.7.0|512|20110101|assigned|A2

test|FR|ipv6|2001:db8::|32|20120101|allocated|A3
test|NL|asn|1101|1|19930901|allocated|A4
test||ipv4|9.9.9.0|256||available
";

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify(""), LineKind::Ignored);
        assert_eq!(classify("   "), LineKind::Ignored);
        assert_eq!(classify("# comment|ipv4"), LineKind::Ignored);
        assert_eq!(
            classify("2|apnic|20240101|100|19830613|20231231|+1000"),
            LineKind::Version
        );
        assert_eq!(classify("apnic|*|ipv4|*|100|summary"), LineKind::Summary);
        assert_eq!(
            classify("apnic|AU|ipv4|1.0.0.0|256|20110811|assigned"),
            LineKind::Ip
        );
        assert_eq!(
            classify("apnic|JP|asn|173|1|20020801|allocated"),
            LineKind::Asn
        );
        assert_eq!(
            classify("apnic|JP|asn32|173|1|20020801|allocated"),
            LineKind::Unsupported
        );
        assert_eq!(classify("apnic|JP"), LineKind::Unsupported);
    }

    #[test]
    fn test_parse_feed() {
        let records = parse_str("test", FEED).unwrap();
        assert_eq!(records.source(), "test");

        let version = records.version().unwrap();
        assert_eq!(version.version, 2.3);
        assert_eq!(version.registry, "test");
        assert_eq!(version.records, 6);
        assert_eq!(version.utc_offset, "+0000");

        // declared counts and parsed entries are tracked independently
        assert_eq!(records.summary().asn, Some(3));
        assert_eq!(records.summary().ipv4, Some(5));
        assert_eq!(records.summary().ipv6, Some(1));
        assert_eq!(records.ips().len(), 4);
        assert_eq!(records.asns().len(), 1);
        assert_eq!(records.skipped(), 0);

        let first = &records.ips()[0];
        assert_eq!(first.country(), "FR");
        assert_eq!(first.entry().opaque_id(), Some("A1"));
        assert_eq!(
            *first.allocation(),
            IpAllocation::V4 {
                start: Ipv4Addr::new(1, 2, 3, 0),
                count: 256
            }
        );

        let v6 = &records.ips()[2];
        assert_eq!(v6.family(), Family::Ipv6);
        assert_eq!(
            *v6.allocation(),
            IpAllocation::V6 {
                start: "2001:db8::".parse::<Ipv6Addr>().unwrap(),
                prefix_len: 32
            }
        );

        let asn = &records.asns()[0];
        assert_eq!(asn.start(), 1101);
        assert_eq!(asn.count(), 1);
        assert_eq!(asn.country(), "NL");

        let unallocated = &records.ips()[3];
        assert_eq!(unallocated.country(), "");
        assert_eq!(unallocated.entry().opaque_id(), None);
        assert_eq!(unallocated.entry().status(), "available");
    }

    #[test]
    fn test_entries_keep_line_order() {
        let records = parse_str("test", FEED).unwrap();
        let starts: Vec<String> = records.ips().iter().map(|e| e.start().to_string()).collect();
        assert_eq!(starts, vec!["1.2.3.0", "5.6.7.0", "2001:db8::", "9.9.9.0"]);
    }

    #[test]
    fn test_summary_without_entries() {
        let feed = "2|x|1|0|19700101|19700101|+0000\nx|*|ipv4|*|1000|summary\n";
        let records = parse_str("x", feed).unwrap();
        assert_eq!(records.summary().ipv4, Some(1000));
        assert!(records.ips().is_empty());
    }

    #[test]
    fn test_unsupported_family_is_skipped() {
        let feed = "test|FR|foo|1|1|20100101|allocated\ntest|FR|asn|1|1|20100101|allocated\n";
        let records = parse_str("test", feed).unwrap();
        assert_eq!(records.skipped(), 1);
        assert_eq!(records.asns().len(), 1);
        assert!(records.ips().is_empty());
    }

    #[test]
    fn test_unknown_summary_family_is_ignored() {
        let records = parse_str("test", "test|*|ipx|*|7|summary\n").unwrap();
        assert_eq!(records.summary(), &SummaryCounts::default());
    }

    #[test]
    fn test_crlf_lines() {
        let feed = "test|FR|ipv4|1.2.3.0|256|20100101|allocated\r\n";
        let records = parse_str("test", feed).unwrap();
        assert_eq!(records.ips()[0].entry().status(), "allocated");
    }

    #[test]
    fn test_malformed_host_count() {
        let feed = "# header\ntest|FR|ipv4|1.2.3.0|lots|20100101|allocated\n";
        let err = parse_str("test", feed).unwrap_err();
        match err {
            ParseError::MalformedField {
                line, field, value, ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(field, "host count");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_address() {
        let err = parse_str("test", "test|FR|ipv4|1.2.3|256|20100101|allocated").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField {
                field: "start address",
                ..
            }
        ));

        // an IPv6 literal on an ipv4 line
        let err = parse_str("test", "test|FR|ipv4|2001:db8::|256|20100101|allocated").unwrap_err();
        assert!(err.to_string().contains("not an ipv4 address"));
    }

    #[test]
    fn test_unknown_ip_family_is_malformed() {
        let err = parse_str("test", "test|FR|ipv5|1.2.3.0|256|20100101|allocated").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField { field: "family", .. }
        ));
    }

    #[test]
    fn test_range_past_ipv4_space() {
        let err =
            parse_str("test", "test|FR|ipv4|255.255.255.0|257|20100101|allocated").unwrap_err();
        assert!(err.to_string().contains("exceeds the IPv4 space"));
    }

    #[test]
    fn test_ipv6_prefix_length_bounds() {
        let err = parse_str("test", "test|FR|ipv6|2001:db8::|129|20100101|allocated").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField {
                field: "prefix length",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_fields() {
        let err = parse_str("test", "test|FR|ipv4|1.2.3.0|256").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingField {
                line: 1,
                expected: 7,
                found: 5
            }
        ));
    }

    #[test]
    fn test_malformed_version() {
        let err = parse_str("test", "2|test|1|many|19830101|20240101|+0000").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField {
                field: "record count",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_parse_reader() {
        let reader = std::io::Cursor::new(FEED.as_bytes().to_vec());
        let records = parse_reader("test", reader).await.unwrap();
        assert_eq!(records, parse_str("test", FEED).unwrap());
    }
}
