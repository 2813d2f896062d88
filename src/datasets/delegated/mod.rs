//! RIR delegation feeds ("delegated-extended" statistics files)
//!
//! - [`parser`]: line classification and decoding into a [`RecordSet`]
//! - [`record`]: the typed records
//! - [`prefix`]: CIDR decomposition of delegated ranges

pub mod error;
pub mod parser;
pub mod prefix;
pub mod record;

pub use error::ParseError;
pub use parser::{classify, parse_reader, parse_str, LineKind, RecordParser};
pub use prefix::{decompose_v4, Ipv4Blocks, Prefixes};
pub use record::{
    AsnEntry, Entry, Family, IpAllocation, IpEntry, RecordSet, SummaryCount, SummaryCounts,
    VersionHeader,
};
