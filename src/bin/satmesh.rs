use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use satmesh::config::SimulationConfig;
use satmesh::metrics::{start_metrics_server, MetricsConfig};
use satmesh::simulation::{build_registry, Simulation};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "satmesh")]
#[command(about = "Satellite relay mesh simulator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ground station, satellites and vessels
    Run {
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
        /// Log filter, overrides RUST_LOG
        #[arg(short, long)]
        log_level: Option<String>,
        /// Serve Prometheus metrics on this address
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },
    /// Validate a configuration file and print the topology
    Check {
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            log_level,
            metrics_addr,
        } => {
            init_tracing(log_level.as_deref());
            cmd_run(config, metrics_addr).await
        }
        Commands::Check { config } => {
            init_tracing(None);
            cmd_check(config)
        }
    }
}

async fn cmd_run(path: PathBuf, metrics_addr: Option<SocketAddr>) -> Result<()> {
    let config = SimulationConfig::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    if let Some(addr) = metrics_addr {
        start_metrics_server(MetricsConfig::with_addr(addr))
            .context("starting metrics exporter")?;
    }

    let simulation = Simulation::start(config)
        .await
        .context("starting simulation")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("Shutdown requested");

    for node in simulation.nodes() {
        tracing::info!(node = %node.node_id(), stats = %node.stats(), "Final relay statistics");
    }
    tracing::info!(
        stored = simulation.ground_station().received(),
        "Ground station messages stored this run"
    );

    simulation.shutdown().await;
    Ok(())
}

fn cmd_check(path: PathBuf) -> Result<()> {
    let config = SimulationConfig::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    config.validate()?;
    let registry = build_registry(&config)?;

    println!("Configuration OK: {}", path.display());
    println!("  ground station: {}", config.ground_station_address);
    println!("  api:            {}", config.api_address);
    for id in registry.node_ids() {
        let Some(node) = registry.get(&id) else {
            continue;
        };
        let uplink = if node.ground_uplink { "uplink" } else { "no uplink" };
        println!("  {} @ {} ({uplink})", node.id, node.addr);
        for (neighbor, link) in &node.links {
            println!("    -> {neighbor}: {link}");
        }
    }
    for vessel in &config.vessels {
        println!("  vessel {} -> {}", vessel.id, vessel.satellite);
    }
    Ok(())
}
