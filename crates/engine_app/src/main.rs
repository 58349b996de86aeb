//! # engine_app
//!
//! Runs the built-in catalog on a fixed-timestep server and mirrors the world
//! into a second entity manager through encoded snapshots.
//!
//! ## Startup Sequence
//!
//! 1. Build the kind registry, keeping class ids from `--class-map`.
//! 2. Spawn the mirror's receive task.
//! 3. Run the server loop on a blocking thread, sending snapshots.
//! 4. Apply what the mirror received and compare it with the server.

mod config;
mod sim;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use engine_component::IdAllocator;
use engine_entity::{EntityGroups, remote_channel};
use engine_net::KindManifest;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::SimConfig;

#[derive(Parser, Debug)]
#[command(name = "engine_app", about = "Entity composition simulation with a snapshot mirror")]
struct Args {
    /// Target ticks per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Ticks to run before exiting
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Entities spawned at start-up
    #[arg(short, long, default_value_t = 32)]
    population: usize,

    /// Ticks between snapshots
    #[arg(short, long, default_value_t = 30)]
    snapshot_interval: u64,

    /// Class id map, created if missing
    #[arg(short, long, env = "ENGINE_CLASS_MAP")]
    class_map: Option<PathBuf>,

    /// Print the kind manifest as JSON and exit
    #[arg(long)]
    manifest: bool,
}

impl From<&Args> for SimConfig {
    fn from(args: &Args) -> Self {
        let config = SimConfig::default()
            .with_tick_rate(args.tick_rate)
            .with_ticks(args.ticks)
            .with_population(args.population)
            .with_snapshot_interval(args.snapshot_interval);
        match &args.class_map {
            Some(path) => config.with_class_map(path),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = SimConfig::from(&args);
    config.validate()?;

    let registry = match sim::load_registry(config.class_map.as_deref()) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("failed to build kind registry: {e:#}");
            return Err(e);
        }
    };
    info!(
        kinds = registry.len(),
        capabilities = registry.capabilities().count(),
        "kind registry ready"
    );

    if args.manifest {
        println!("{}", KindManifest::from_registry(&registry).to_json()?);
        return Ok(());
    }

    // Mirror side: its own ids, fed through the remote inbox.
    let ids = Arc::new(IdAllocator::new());
    let (remote, mut inbox) = remote_channel();
    let mut mirror = EntityGroups::with_ids(Arc::clone(&registry), Arc::clone(&ids));
    let (wire_tx, wire_rx) = mpsc::unbounded_channel();
    let receiver = tokio::spawn(sim::mirror(Arc::clone(&registry), ids, remote, wire_rx));

    info!(
        tick_rate = config.tick_rate,
        ticks = config.ticks,
        population = config.population,
        "engine server starting"
    );
    let server_config = config.clone();
    let server_registry = Arc::clone(&registry);
    let report = tokio::task::spawn_blocking(move || {
        sim::run_server(&server_config, server_registry, &wire_tx)
    })
    .await??;

    let received = receiver.await?;
    let applied = inbox.drain_into(&mut mirror);

    info!(
        ticks = report.ticks,
        entities = report.entities,
        local = report.local,
        snapshots = report.snapshots,
        bytes = report.bytes,
        "server finished"
    );
    info!(received, applied, entities = mirror.len(), "mirror caught up");
    if mirror.len() != report.last_snapshot {
        warn!(
            expected = report.last_snapshot,
            got = mirror.len(),
            "mirror diverged from last snapshot"
        );
    }

    Ok(())
}
