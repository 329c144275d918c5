//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Completion, Pipeline, PipelineConfig, ReplayPlan};

/// Execute the `run` command
pub async fn run_replay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let selection = args.selection.selection()?;

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(speed) = args.speed {
        info!(speed, "Overriding replay speed from CLI");
        blueprint.replay.speed = speed;
    }
    if let Some(ref base_dir) = args.base_dir {
        info!(base_dir = %base_dir.display(), "Overriding base directory from CLI");
        blueprint.replay.base_dir = Some(base_dir.clone());
    }

    info!(
        brokers = blueprint.brokers.len(),
        artifacts = blueprint.artifacts.len(),
        stakeholders = blueprint.stakeholders.len(),
        speed = blueprint.replay.speed,
        selection = ?selection,
        "Configuration loaded"
    );

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        base_dir: blueprint.replay.base_dir.clone(),
        speed: blueprint.replay.speed,
        blueprint,
        selection,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    // Dry run - resolve and load, never connect
    if args.dry_run {
        let plan = pipeline.plan().context("Failed to plan replay")?;
        info!("Dry run mode - nothing will be published, exiting");
        print_plan(&plan);
        return Ok(());
    }

    info!("Starting replay...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Replay execution failed")?;

    info!(
        fired = stats.events_fired,
        scheduled = stats.events_scheduled,
        duration_secs = stats.duration.as_secs_f64(),
        rate = format!("{:.2}", stats.fire_rate()),
        "Replay completed"
    );
    stats.print_summary();

    if stats.completion == Completion::Interrupted {
        warn!("Replay interrupted before every event fired");
    }

    info!("Stream Emulator finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print the replay plan for dry-run mode
fn print_plan(plan: &ReplayPlan) {
    println!("\n=== Replay Plan ===\n");

    println!("Entities ({}):", plan.topology.len());
    for entity in plan.topology.entities() {
        let events = plan.events.get(&entity.key).map_or(0, <[_]>::len);
        println!(
            "  - [{}] {} -> {} ({} events)",
            entity.kind().as_str(),
            entity.key.topic(),
            entity.endpoint,
            events
        );
    }

    if !plan.topology.excluded_artifacts().is_empty() {
        println!("\nExcluded artifacts ({}):", plan.topology.excluded_artifacts().len());
        for excluded in plan.topology.excluded_artifacts() {
            println!("  - {} ({:?})", excluded.key, excluded.reason);
        }
    }

    println!("\nStreams:");
    println!("  Events: {}", plan.load_report.events);
    println!("  Lines skipped: {}", plan.load_report.skipped_lines);
    for (key, error) in &plan.load_report.failed {
        println!("  Unreadable: {} ({})", key, error);
    }

    println!();
}
