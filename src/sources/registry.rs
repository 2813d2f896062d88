//! Regional internet registries publishing delegation feeds

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default mirror carrying the feeds of all registries
pub const DEFAULT_MIRROR_URL: &str = "https://ftp.ripe.net/pub/stats";

/// A regional internet registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    Afrinic,
    Apnic,
    Arin,
    Lacnic,
    RipeNcc,
    Iana,
}

impl Registry {
    /// All registries queried by default (IANA only republishes RIR data)
    pub fn defaults() -> Vec<Registry> {
        vec![
            Registry::Afrinic,
            Registry::Apnic,
            Registry::Arin,
            Registry::Lacnic,
            Registry::RipeNcc,
        ]
    }

    /// Name used by the registry in its feed and file names
    pub fn name(&self) -> &'static str {
        match self {
            Registry::Afrinic => "afrinic",
            Registry::Apnic => "apnic",
            Registry::Arin => "arin",
            Registry::Lacnic => "lacnic",
            Registry::RipeNcc => "ripencc",
            Registry::Iana => "iana",
        }
    }

    /// Location of the latest feed under the given mirror
    pub fn feed_url(&self, mirror: &str) -> String {
        let mirror = mirror.trim_end_matches('/');
        match self {
            // IANA does not publish an extended feed
            Registry::Iana => format!("{}/iana/delegated-iana-latest", mirror),
            r => format!(
                "{}/{}/delegated-{}-extended-latest",
                mirror,
                r.name(),
                r.name()
            ),
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Registry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "afrinic" => Ok(Registry::Afrinic),
            "apnic" => Ok(Registry::Apnic),
            "arin" => Ok(Registry::Arin),
            "lacnic" => Ok(Registry::Lacnic),
            "ripencc" | "ripe" | "ripe-ncc" => Ok(Registry::RipeNcc),
            "iana" => Ok(Registry::Iana),
            other => Err(format!(
                "unknown registry '{}'. Valid registries: afrinic, apnic, arin, lacnic, ripencc, iana",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url() {
        assert_eq!(
            Registry::Apnic.feed_url(DEFAULT_MIRROR_URL),
            "https://ftp.ripe.net/pub/stats/apnic/delegated-apnic-extended-latest"
        );
        assert_eq!(
            Registry::RipeNcc.feed_url("https://example.net/stats/"),
            "https://example.net/stats/ripencc/delegated-ripencc-extended-latest"
        );
        assert_eq!(
            Registry::Iana.feed_url(DEFAULT_MIRROR_URL),
            "https://ftp.ripe.net/pub/stats/iana/delegated-iana-latest"
        );
    }

    #[test]
    fn test_registry_from_str() {
        assert_eq!("ARIN".parse::<Registry>(), Ok(Registry::Arin));
        assert_eq!(" ripe ".parse::<Registry>(), Ok(Registry::RipeNcc));
        assert!("nic".parse::<Registry>().is_err());
    }

    #[test]
    fn test_defaults_exclude_iana() {
        let defaults = Registry::defaults();
        assert_eq!(defaults.len(), 5);
        assert!(!defaults.contains(&Registry::Iana));
    }
}
