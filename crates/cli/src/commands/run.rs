//! `run` command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use contracts::{CredentialHook, RunConfig, SensorSelection, StartTime};
use observability::StatsSummary;
use simulator::{RunOptions, RunSummary};
use transfer::SessionConfig;

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_simulation(args: &RunArgs) -> Result<()> {
    let config = build_run_config(args)?;

    // Resolve the destination now so an unrecognized scheme is fatal before
    // anything else happens
    let destination = transfer::Destination::parse(&config.destination)?;

    info!(
        backend = destination.backend_name(),
        starttime = %config.starttime,
        numexp = config.numexp,
        sensors = config.sensors.len(),
        interval = config.interval,
        compress = ?config.compress,
        "Configuration loaded"
    );

    // Initialize Metrics (optional)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let credential_file = install_credentials(args)?;
    let mut session_config = SessionConfig {
        credential_file,
        ..SessionConfig::default()
    };
    if let Some(endpoint) = &args.endpoint {
        session_config.endpoint = endpoint.clone();
    }

    let options = RunOptions {
        hosts_file: args.hosts_file.clone(),
    };

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting simulation...");

    tokio::select! {
        result = simulator::run(config, session_config, options) => {
            let summary = result.context("Simulation failed")?;
            print_summary(&summary);

            let failed = summary.failed_workers();
            if failed > 0 {
                return Err(CliError::workers_failed(failed, summary.workers.len()).into());
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping simulation...");
        }
    }

    info!("CCD Streamer finished");
    Ok(())
}

/// Build the effective RunConfig from the config file and flag overrides.
fn build_run_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration file");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let destination = require(args.destination.clone(), "--destination")?;
            let starttime = parse_starttime(&require(args.starttime.clone(), "--starttime")?)?;
            let numexp = require(args.numexp, "--numexp")?;
            RunConfig::new(destination, starttime, numexp)
        }
    };

    apply_overrides(&mut config, args)?;
    config_loader::validate(&config)?;
    Ok(config)
}

fn require<T>(value: Option<T>, option: &str) -> Result<T> {
    value.ok_or_else(|| CliError::missing_option(option).into())
}

fn parse_starttime(raw: &str) -> Result<StartTime> {
    raw.parse::<StartTime>()
        .with_context(|| format!("Invalid --starttime '{raw}'"))
}

fn apply_overrides(config: &mut RunConfig, args: &RunArgs) -> Result<()> {
    if args.config.is_some() {
        if let Some(destination) = &args.destination {
            config.destination = destination.clone();
        }
        if let Some(starttime) = &args.starttime {
            config.starttime = parse_starttime(starttime)?;
        }
        if let Some(numexp) = args.numexp {
            config.numexp = numexp;
        }
    }
    if !args.sensors.is_empty() {
        config.sensors =
            SensorSelection::Names(args.sensors.iter().map(|s| s.as_str().into()).collect());
    } else if let Some(ccds) = args.ccds {
        config.sensors = SensorSelection::Count(ccds);
    }
    if let Some(interval) = args.interval {
        config.interval = interval;
    }
    if let Some(inputfile) = &args.inputfile {
        config.inputfile = Some(inputfile.clone());
    }
    if let Some(inputdir) = &args.inputdir {
        config.inputdir = inputdir.clone();
    }
    if let Some(tempdir) = &args.tempdir {
        config.tempdir = tempdir.clone();
    }
    if args.compress {
        config.compress = Some(args.compressor.into());
    }
    if args.private {
        config.private = true;
    }
    Ok(())
}

/// Install credential material from the environment, if present.
fn install_credentials(args: &RunArgs) -> Result<Option<PathBuf>> {
    let target = args
        .credential_file
        .clone()
        .unwrap_or_else(default_credential_file);
    let hook = CredentialHook::new(&args.credential_env, target);
    let installed = hook
        .install()
        .context("Failed to install credential file")?;
    if let Some(path) = &installed {
        info!(
            var = hook.source_var(),
            path = %path.display(),
            "Using injected credentials"
        );
    }
    Ok(installed)
}

fn default_credential_file() -> PathBuf {
    std::env::temp_dir().join("ccd-streamer").join("credentials.json")
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print the end-of-run summary
fn print_summary(summary: &RunSummary) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                        Run Statistics                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("   ├─ Workers: {}", summary.workers.len());
    println!("   ├─ Failed workers: {}", summary.failed_workers());
    println!("   ├─ Exposures completed: {}", summary.total_exposures());
    println!("   ├─ Bytes staged: {}", summary.total_bytes_staged());
    println!("   └─ Exposures/s: {:.2}", summary.exposures_per_second());

    println!("\n📡 Workers");
    for worker in &summary.workers {
        let status = if worker.succeeded() { "ok" } else { "FAILED" };
        println!(
            "   ├─ {} [{}]: {} exposures, {} late",
            worker.sensor, status, worker.stats.exposures_completed, worker.stats.late_exposures
        );
        println!(
            "   │    ├─ staging (s): {}",
            StatsSummary::from(&worker.stats.staging_secs)
        );
        println!(
            "   │    ├─ transfer (s): {}",
            StatsSummary::from(&worker.stats.transfer_secs)
        );
        if let Some(error) = &worker.error {
            println!("   │    └─ error: {}", error);
        }
    }

    println!();
}
