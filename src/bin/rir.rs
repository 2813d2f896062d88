use clap::{Parser, Subcommand};
use rir::lens::delegation::{CountryQueryArgs, DelegationLens, IpLookupArgs};
use rir::{Registry, RirConfig, SourceCollector};
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::summary::SummaryArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.rir/rir.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Only query this registry (repeatable), e.g. ripencc or arin
    #[clap(short, long = "registry", value_name = "NAME")]
    registries: Vec<Registry>,

    /// Always download the feeds, ignoring the local cache
    #[clap(long)]
    no_cache: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every delegated prefix with its country code
    All {
        /// Stop after this many prefixes
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// List the prefixes delegated to a country, or count their addresses
    Country(CountryQueryArgs),

    /// Find the delegations containing an IP address
    Ip(IpLookupArgs),

    /// Show what each registry's feed declares and contains
    Summary(SummaryArgs),

    /// Show the effective configuration and cache status
    Config(ConfigArgs),
}

fn build_lens(config: &RirConfig, registries: Vec<Registry>, no_cache: bool) -> DelegationLens {
    let registries = if registries.is_empty() {
        match config.registries() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        registries
    };

    DelegationLens::new(SourceCollector::from_registries(
        &registries,
        config,
        !no_cache,
    ))
}

#[tokio::main]
async fn main() {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // stdout carries query results only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::WARN })
        .init();

    let config = match RirConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::All { limit } => {
            let lens = build_lens(&config, cli.registries, cli.no_cache);
            commands::all::run(&lens, limit).await
        }
        Commands::Country(args) => {
            let lens = build_lens(&config, cli.registries, cli.no_cache);
            commands::country::run(&lens, args).await
        }
        Commands::Ip(args) => {
            let lens = build_lens(&config, cli.registries, cli.no_cache);
            commands::ip::run(&lens, args).await
        }
        Commands::Summary(args) => {
            let lens = build_lens(&config, cli.registries, cli.no_cache);
            commands::summary::run(&lens, args).await
        }
        Commands::Config(args) => commands::config::run(&config, args).await,
    }
}
