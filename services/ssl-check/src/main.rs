//! ssl-check CLI
//!
//! Runs one check invocation and prints the response JSON.

use std::path::PathBuf;

use clap::Parser;
use ssl_check::invocation::load_event;
use ssl_check::{load_config, Config, InvocationEvent, SslCheckBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "ssl-check")]
#[command(about = "TLS handshake check for UptimeRobot HTTPS monitors")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UptimeRobot API key (ignored when --event is given)
    #[arg(long, env = "UPTIME_ROBOT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to a JSON invocation event
    #[arg(long)]
    event: Option<PathBuf>,

    /// Log group for the diagnostics link
    #[arg(long, env = "AWS_LAMBDA_LOG_GROUP_NAME")]
    log_group: Option<String>,

    /// Log stream for the diagnostics link
    #[arg(long, env = "AWS_LAMBDA_LOG_STREAM_NAME")]
    log_stream: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, event={:?}, log_group={:?}, log_level={:?}",
        args.config,
        args.event,
        args.log_group,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };
    config.apply_env(|key| std::env::var(key).ok());

    let event = match &args.event {
        Some(path) => {
            tracing::debug!("Loading invocation event from {:?}", path);
            load_event(path)?
        }
        None => args
            .api_key
            .map(InvocationEvent::with_api_key)
            .unwrap_or_default(),
    };

    let check = SslCheckBuilder::new(config).build()?;
    let context = check.context(args.log_group, args.log_stream);

    match check.handle(&event, &context).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Check failed: {}", e);
            Err(e.into())
        }
    }
}
