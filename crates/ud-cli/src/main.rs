//! Userdesk command-line console
//!
//! Talks to the users admin API: sign in, page through users with the
//! filter-rule engine, edit a user, and print the statistics counts.

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ud_core::config::{AppConfig, LoggingConfig};
use ud_core::UdError;

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path)),
        None => AppConfig::from_env(),
    }
    .context("failed to load configuration")?;
    init_tracing(&config.logging);
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api.base_url,
        "Configuration loaded"
    );

    let result = commands::run(cli.command, config).await;
    if let Err(err) = &result {
        if err
            .downcast_ref::<UdError>()
            .is_some_and(UdError::requires_reauthentication)
        {
            error!("Not signed in or session expired; run `userdesk login`");
        }
    }
    result
}

/// Initialize tracing/logging on stderr
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let json_layer = logging
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
