//! Deep Zoom Builder - converts one image into a DZI tile pyramid.
//!
//! This binary parses arguments, configures logging and runs a single build.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepzoom_builder::{config::Cli, BuildReport, CancelFlag, PyramidBuilder};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Validate configuration
    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let config = cli.build_config();

    info!("Configuration:");
    info!("  Source: {}", cli.source.display());
    info!("  Destination: {}", cli.destination.display());
    info!("  Format: {}", config.format);
    info!("  Tiles: {}px, {}px overlap", config.tile_size, config.overlap);
    info!("  Workers: {}", config.workers);

    let cancel = CancelFlag::new();
    spawn_ctrl_c_handler(cancel.clone());

    let builder = PyramidBuilder::new(config).with_cancel_flag(cancel);
    let report = match builder.build(&cli.source, &cli.destination).await {
        Ok(report) => report,
        Err(e) => {
            error!("Build failed: {}", e);
            error!("Tiles written so far were left in place; the manifest was not written.");
            return ExitCode::FAILURE;
        }
    };

    print_summary(&report);

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Cancel the build at the next tile boundary on Ctrl-C.
fn spawn_ctrl_c_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current tiles...");
            cancel.cancel();
        }
    });
}

fn print_summary(report: &BuildReport) {
    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Manifest: {}", report.manifest_path);
    info!("  Tiles:    {}", report.files_dir);
    info!(
        "  Levels:   0..={} ({} tiles total)",
        report.max_level,
        report.total_tiles()
    );
    if !report.warnings.is_empty() {
        warn!("  {} warning(s):", report.warnings.len());
        for warning in &report.warnings {
            warn!("    {}", warning);
        }
    }
    info!("────────────────────────────────────────────────────────────────");
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "deepzoom_builder=debug"
    } else {
        "deepzoom_builder=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
