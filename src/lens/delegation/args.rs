//! Delegation lens arguments
//!
//! These arguments are shared by the CLI (with clap derives when the `cli`
//! feature is enabled) and library callers (via serde).

use serde::{Deserialize, Serialize};

/// Arguments for country queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct CountryQueryArgs {
    /// Two-letter country code, e.g. "FR" (case-insensitive)
    #[cfg_attr(feature = "cli", clap(value_name = "CC"))]
    pub country: String,

    /// Print the number of usable host addresses per address family instead of prefixes
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub hosts: bool,

    /// Stop after this many prefixes
    #[cfg_attr(feature = "cli", clap(short, long))]
    #[serde(default)]
    pub limit: Option<usize>,
}

impl CountryQueryArgs {
    /// Create new arguments for a country code
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            ..Default::default()
        }
    }

    /// Count hosts instead of listing prefixes
    pub fn hosts(mut self) -> Self {
        self.hosts = true;
        self
    }

    /// Stop after `limit` prefixes
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The country code as registries publish it (uppercase)
    pub fn normalized_country(&self) -> String {
        self.country.trim().to_ascii_uppercase()
    }

    /// Validate the arguments
    ///
    /// Returns an error message if the arguments are invalid.
    pub fn validate(&self) -> Result<(), String> {
        let country = self.country.trim();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!(
                "country code must be two letters, got '{}'",
                self.country
            ));
        }
        Ok(())
    }
}

/// Arguments for address containment queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct IpLookupArgs {
    /// IPv4 or IPv6 address to look up
    #[cfg_attr(feature = "cli", clap(value_name = "ADDR"))]
    pub ip: String,

    /// Stop after this many matches
    #[cfg_attr(feature = "cli", clap(short, long))]
    #[serde(default)]
    pub limit: Option<usize>,
}

impl IpLookupArgs {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            limit: None,
        }
    }

    /// Stop after `limit` matches
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_args_validate() {
        assert!(CountryQueryArgs::new("FR").validate().is_ok());
        assert!(CountryQueryArgs::new(" fr ").validate().is_ok());
        assert!(CountryQueryArgs::new("FRA").validate().is_err());
        assert!(CountryQueryArgs::new("").validate().is_err());
        assert!(CountryQueryArgs::new("F1").validate().is_err());
    }

    #[test]
    fn test_country_args_builder() {
        let args = CountryQueryArgs::new("fr").hosts().with_limit(3);
        assert!(args.hosts);
        assert_eq!(args.limit, Some(3));
        assert_eq!(args.normalized_country(), "FR");
    }

    #[test]
    fn test_ip_args_deserialize() {
        let args: IpLookupArgs = serde_json::from_str(r#"{"ip": "1.2.3.10"}"#).unwrap();
        assert_eq!(args.ip, "1.2.3.10");
        assert_eq!(args.limit, None);
    }
}
