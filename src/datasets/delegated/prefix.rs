//! CIDR decomposition of delegated ranges
//!
//! IPv4 delegations are published as a start address and a host count, which
//! need not be a power of two nor aligned. [`decompose_v4`] splits such a range
//! into the minimal ordered list of aligned prefixes covering it exactly:
//!
//! ```text
//! 10.0.0.4 + 5 hosts  ->  10.0.0.4/30, 10.0.0.8/32
//! ```
//!
//! IPv6 delegations already carry a prefix length and are returned unchanged.

use crate::datasets::delegated::record::{IpAllocation, IpEntry};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::iter::FusedIterator;
use std::net::Ipv4Addr;

/// Size of the IPv4 address space
pub const IPV4_SPACE: u64 = 1 << 32;

/// Lazily split `count` hosts starting at `start` into aligned IPv4 prefixes.
///
/// Ranges running past the end of the address space are clipped at
/// `255.255.255.255`; the parser rejects them before they get here.
pub fn decompose_v4(start: Ipv4Addr, count: u64) -> Ipv4Blocks {
    let current = u64::from(u32::from(start));
    Ipv4Blocks {
        current,
        remaining: count.min(IPV4_SPACE - current),
    }
}

/// Iterator over the prefixes of an IPv4 range, see [`decompose_v4`]
#[derive(Debug, Clone)]
pub struct Ipv4Blocks {
    current: u64,
    remaining: u64,
}

impl Ipv4Blocks {
    /// Largest block size (as a power of two) usable at the current position
    fn next_block_bits(&self) -> u32 {
        // 0.0.0.0 is aligned on every boundary
        let max_align = if self.current == 0 {
            32
        } else {
            self.current.trailing_zeros().min(32)
        };
        // floor(log2(remaining)), remaining > 0
        let max_fit = 63 - self.remaining.leading_zeros();
        max_align.min(max_fit)
    }
}

impl Iterator for Ipv4Blocks {
    type Item = Ipv4Net;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let bits = self.next_block_bits();
        let addr = Ipv4Addr::from(self.current as u32);
        let prefix = Ipv4Net::new(addr, (32 - bits) as u8).ok()?;

        let size = 1u64 << bits;
        self.current += size;
        self.remaining -= size;

        Some(prefix)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            (0, Some(0))
        } else {
            // at most two blocks per bit of the count
            (1, Some(64))
        }
    }
}

impl FusedIterator for Ipv4Blocks {}

/// Prefixes covered by one delegation entry
#[derive(Debug, Clone)]
pub enum Prefixes {
    V4(Ipv4Blocks),
    V6(std::option::IntoIter<Ipv6Net>),
}

impl Iterator for Prefixes {
    type Item = IpNet;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Prefixes::V4(blocks) => blocks.next().map(IpNet::V4),
            Prefixes::V6(single) => single.next().map(IpNet::V6),
        }
    }
}

impl FusedIterator for Prefixes {}

impl IpAllocation {
    /// CIDR prefixes covering exactly this allocation
    pub fn prefixes(&self) -> Prefixes {
        match *self {
            IpAllocation::V4 { start, count } => Prefixes::V4(decompose_v4(start, count)),
            IpAllocation::V6 { start, prefix_len } => {
                Prefixes::V6(Ipv6Net::new(start, prefix_len).ok().into_iter())
            }
        }
    }
}

impl IpEntry {
    /// CIDR prefixes covering exactly this entry's address range
    pub fn prefixes(&self) -> Prefixes {
        self.allocation().prefixes()
    }
}
