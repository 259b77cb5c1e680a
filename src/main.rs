//! Mock Requests - CLI Entry Point
//!
//! Loads a mock configuration and reports how request URLs resolve.

use anyhow::Result;
use clap::Parser;
use mock_requests::{MockRequests, MockRequestsConfig};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mock-requests",
    about = "Request mocking layer - resolve URLs against configured mock payloads",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mock-requests.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Resolve a request URL against the configured mocks (repeatable)
    #[arg(short, long, value_name = "URL")]
    resolve: Vec<String>,

    /// Request body passed to dynamic responses
    #[arg(short, long)]
    body: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    // Load configuration
    let config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        MockRequestsConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration (no mocks)");
        MockRequestsConfig::default()
    };

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} mocks defined)",
            config.mock_count()
        );
        return Ok(());
    }

    let mocks = MockRequests::from_config(config);

    if args.resolve.is_empty() {
        for key in mocks.registry().keys() {
            println!("{}", key);
        }
        return Ok(());
    }

    for url in &args.resolve {
        let report = match mocks.registry().resolve(url, args.body.as_deref()).await? {
            Some(resolved) => json!({
                "url": url,
                "mocked": true,
                "matched": resolved.matched,
                "delay_ms": resolved.delay_ms,
                "query_params": resolved.query_params,
                "response": resolved.response,
            }),
            None => json!({ "url": url, "mocked": false }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
