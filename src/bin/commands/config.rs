use clap::Args;
use rir::sources::{CachedSource, RemoteSource};
use rir::RirConfig;
use serde::Serialize;

use super::{fail, print_line};

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    cache_dir: String,
    cache_ttl_secs: u64,
    mirror_url: String,
    registries: Vec<RegistryInfo>,
}

#[derive(Debug, Serialize)]
struct RegistryInfo {
    name: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_bytes: Option<u64>,
}

pub async fn run(config: &RirConfig, args: ConfigArgs) {
    let registries = match config.registries() {
        Ok(r) => r,
        Err(e) => fail(e),
    };

    let mut infos = Vec::with_capacity(registries.len());
    for registry in registries {
        let remote = RemoteSource::for_registry(registry, &config.mirror_url);
        let url = remote.url().to_string();
        let cached = CachedSource::new(remote, config.cache_dir(), config.cache_ttl());
        let meta = cached.load_meta().await;
        infos.push(RegistryInfo {
            name: registry.to_string(),
            url,
            cached_at: meta.as_ref().map(|m| m.cached_at.to_rfc3339()),
            cached_bytes: meta.as_ref().map(|m| m.size),
        });
    }

    let mut stdout = std::io::stdout();

    if args.json {
        let info = ConfigInfo {
            config_file: RirConfig::config_file_path(),
            data_dir: config.data_dir.clone(),
            cache_dir: config.cache_dir(),
            cache_ttl_secs: config.cache_ttl_secs,
            mirror_url: config.mirror_url.clone(),
            registries: infos,
        };
        match serde_json::to_string_pretty(&info) {
            Ok(json) => print_line(&mut stdout, json),
            Err(e) => fail(e),
        }
        return;
    }

    print_line(&mut stdout, config.summary());
    print_line(&mut stdout, "");
    print_line(&mut stdout, "Feeds:");
    for info in infos {
        let status = match (info.cached_at, info.cached_bytes) {
            (Some(at), Some(bytes)) => format!("cached {} ({} bytes)", at, bytes),
            _ => "not cached".to_string(),
        };
        print_line(&mut stdout, format!("  {:<8} {}", info.name, status));
        print_line(&mut stdout, format!("           {}", info.url));
    }
}
