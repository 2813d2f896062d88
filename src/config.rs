use crate::sources::{Registry, DEFAULT_MIRROR_URL};
use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub struct RirConfig {
    /// Path to the directory to hold rir's data
    pub data_dir: String,

    /// How long a cached feed is served without checking the registry (default: 24 hours)
    pub cache_ttl_secs: u64,

    /// Base URL of the mirror carrying all registry feeds
    pub mirror_url: String,

    /// Comma-separated registry names to query
    pub registries: String,

    /// Capacity of the record set channel (0 = one slot per registry)
    pub channel_capacity: usize,
}

const DEFAULT_REGISTRIES: &str = "afrinic,apnic,arin,lacnic,ripencc";

const EMPTY_CONFIG: &str = r#"### rir configuration file

### directory for cached delegation feeds
# data_dir = "~/.rir"

### how long a cached feed is used before checking the registry (in seconds)
# cache_ttl_secs = 86400            # 24 hours

### mirror carrying the delegation feeds of all registries
# mirror_url = "https://ftp.ripe.net/pub/stats"

### registries to query (afrinic, apnic, arin, lacnic, ripencc, iana)
# registries = "afrinic,apnic,arin,lacnic,ripencc"

### record set channel capacity (0 = one slot per registry)
# channel_capacity = 0
"#;

impl Default for RirConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{}/.rir", home_dir),
            cache_ttl_secs: 86400, // 24 hours
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            registries: DEFAULT_REGISTRIES.to_string(),
            channel_capacity: 0,
        }
    }
}

impl RirConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<RirConfig> {
        let mut builder = Config::builder();

        // By default use $HOME/.rir/rir.toml as the configuration file path
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        let rir_dir = format!("{}/.rir", home_dir.as_str());

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(rir_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create rir directory: {}", e))?;
                let p = format!("{}/rir.toml", rir_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of RIR)
        // E.g., `RIR_CACHE_TTL_SECS=3600 ./rir country FR` shortens the cache window
        builder = builder.add_source(config::Environment::with_prefix("RIR"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config, rir_dir.as_str())
    }

    /// Build a configuration from already-merged key/value settings
    fn from_map(config: &HashMap<String, String>, default_dir: &str) -> Result<RirConfig> {
        let data_dir = match config.get("data_dir") {
            Some(p) => expand_home(p),
            None => default_dir.to_string(),
        };

        let cache_ttl_secs = match config.get("cache_ttl_secs") {
            Some(s) => s
                .parse()
                .map_err(|e| anyhow!("Invalid cache_ttl_secs '{}': {}", s, e))?,
            None => 86400,
        };

        let channel_capacity = match config.get("channel_capacity") {
            Some(s) => s
                .parse()
                .map_err(|e| anyhow!("Invalid channel_capacity '{}': {}", s, e))?,
            None => 0,
        };

        let mirror_url = config
            .get("mirror_url")
            .cloned()
            .unwrap_or_else(|| DEFAULT_MIRROR_URL.to_string());

        let registries = config
            .get("registries")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REGISTRIES.to_string());

        let config = RirConfig {
            data_dir,
            cache_ttl_secs,
            mirror_url,
            registries,
            channel_capacity,
        };
        // reject unknown registry names at load time
        config.registries()?;
        Ok(config)
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> String {
        format!("{}/cache", self.data_dir.trim_end_matches('/'))
    }

    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Parse the configured registry list
    pub fn registries(&self) -> Result<Vec<Registry>> {
        let mut registries = Vec::new();
        for name in self.registries.split(',') {
            if name.trim().is_empty() {
                continue;
            }
            let registry: Registry = name.parse().map_err(|e: String| anyhow!(e))?;
            if !registries.contains(&registry) {
                registries.push(registry);
            }
        }
        if registries.is_empty() {
            return Err(anyhow!("No registries configured"));
        }
        Ok(registries)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Config File:        {}", Self::config_file_path()),
            format!("Data Directory:     {}", self.data_dir),
            format!(
                "Cache TTL:          {}",
                humantime::format_duration(self.cache_ttl())
            ),
            format!("Mirror URL:         {}", self.mirror_url),
            format!("Registries:         {}", self.registries),
        ];

        if self.channel_capacity > 0 {
            lines.push(format!("Channel Capacity:   {}", self.channel_capacity));
        }

        let cache_dir = self.cache_dir();
        if Path::new(&cache_dir).exists() {
            lines.push(format!("Cache Directory:    {}", cache_dir));
        }

        lines.join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.rir/rir.toml", home_dir)
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}/{}", home.to_string_lossy(), rest),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RirConfig::default();
        assert!(config.data_dir.ends_with("/.rir"));
        assert_eq!(config.cache_ttl_secs, 86400);
        assert_eq!(config.mirror_url, "https://ftp.ripe.net/pub/stats");
        assert_eq!(config.channel_capacity, 0);
        assert_eq!(config.registries().unwrap(), Registry::defaults());
    }

    #[test]
    fn test_paths() {
        let config = RirConfig {
            data_dir: "/test/dir/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.cache_dir(), "/test/dir/cache");
        assert_eq!(config.cache_ttl(), Duration::from_secs(86400));
    }

    #[test]
    fn test_registries() {
        let config = RirConfig {
            registries: "arin, RIPE,arin,".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.registries().unwrap(),
            vec![Registry::Arin, Registry::RipeNcc]
        );

        let config = RirConfig {
            registries: "arin,nowhere".to_string(),
            ..Default::default()
        };
        assert!(config.registries().is_err());

        let config = RirConfig {
            registries: " , ".to_string(),
            ..Default::default()
        };
        assert!(config.registries().is_err());
    }

    #[test]
    fn test_from_map() {
        let map = HashMap::from([
            ("data_dir".to_string(), "/var/lib/rir".to_string()),
            ("cache_ttl_secs".to_string(), "3600".to_string()),
            ("registries".to_string(), "lacnic".to_string()),
            ("channel_capacity".to_string(), "2".to_string()),
        ]);
        let config = RirConfig::from_map(&map, "/default").unwrap();
        assert_eq!(config.data_dir, "/var/lib/rir");
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.registries().unwrap(), vec![Registry::Lacnic]);
        assert_eq!(config.channel_capacity, 2);
        assert_eq!(config.mirror_url, DEFAULT_MIRROR_URL);

        let config = RirConfig::from_map(&HashMap::new(), "/default").unwrap();
        assert_eq!(config.data_dir, "/default");

        let bad = HashMap::from([("cache_ttl_secs".to_string(), "soon".to_string())]);
        assert!(RirConfig::from_map(&bad, "/default").is_err());
    }

    #[test]
    fn test_summary() {
        let config = RirConfig {
            data_dir: "/nonexistent/rir".to_string(),
            ..Default::default()
        };
        let summary = config.summary();
        assert!(summary.contains("Data Directory:     /nonexistent/rir"));
        assert!(summary.contains("Cache TTL:          1day"));
        assert!(!summary.contains("Cache Directory"));
    }
}
