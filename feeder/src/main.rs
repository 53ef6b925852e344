mod ail;
mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use parser::{prepare, read_dump, Pipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ail::AilClient;
use crate::cli::Cli;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matrix_feeder=info,parser=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let policy = cli.error_policy();

    if cli.dry_run {
        let dump = read_dump(&cli.dump)
            .with_context(|| format!("failed to read dump {}", cli.dump.display()))?;
        let (events, skipped) = prepare(&dump, policy).context("dump is malformed")?;
        for event in &events {
            tracing::info!(
                "Record #{}: {}",
                event.index,
                serde_json::to_string(&event.metadata())?
            );
        }
        tracing::info!("Dry run: {} events ready, {} skipped", events.len(), skipped.len());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    let client = AilClient::connect(&config.ail).with_context(|| {
        format!(
            "unable to connect to AIL at {}; check url, apikey and verifycert in {}",
            config.ail.url,
            cli.config.display()
        )
    })?;

    let dump = read_dump(&cli.dump)
        .with_context(|| format!("failed to read dump {}", cli.dump.display()))?;

    let mut pipeline = Pipeline::new(client, config.ail.feeder_uuid.trim(), policy);
    let report = pipeline.feed_dump(&dump)?;

    for skipped in &report.skipped {
        tracing::warn!("Not submitted: {}", skipped);
    }
    tracing::info!(
        "Submitted {} messages from {}",
        report.submitted,
        cli.dump.display()
    );
    Ok(())
}
