//! The server simulation and its snapshot mirror.
//!
//! The server runs the tick loop on a blocking thread and ships a snapshot
//! every `snapshot_interval` ticks. The mirror receives snapshots on an async
//! task, decodes them against its own id allocator and hands the instances to
//! its tick loop through the remote inbox.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use engine_component::{EntityId, FieldAccess, IdAllocator, LAccess, LValue};
use engine_compose::{ClassIdMap, KindRegistry};
use engine_content::catalog_with;
use engine_entity::{EntityGroups, LocalActor, RemoteOp, RemoteSender, TickLoop};
use engine_net::{Snapshot, decode, encode};
use glam::Vec2;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SimConfig;

/// Radius of the ring the start-up population is placed on.
const RING_RADIUS: f32 = 24.0;

/// Summary of a server run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerReport {
    /// Ticks completed.
    pub ticks: u64,
    /// Entities added at the end.
    pub entities: usize,
    /// Entities the local player acts through at the end.
    pub local: usize,
    /// Snapshots sent.
    pub snapshots: u64,
    /// Entities in the last snapshot sent.
    pub last_snapshot: usize,
    /// Encoded bytes sent.
    pub bytes: usize,
}

/// Build the catalog, keeping and then persisting the ids in `path`.
///
/// # Errors
///
/// Fails if the map cannot be read or written, or the catalog does not
/// compose against it.
pub fn load_registry(path: Option<&Path>) -> anyhow::Result<KindRegistry> {
    let class_map = match path {
        Some(path) => ClassIdMap::load_or_default(path)
            .with_context(|| format!("reading class map {}", path.display()))?,
        None => ClassIdMap::new(),
    };
    let known = class_map.len();

    let registry = catalog_with(class_map).context("composing catalog")?;

    if let Some(path) = path {
        registry
            .class_map()
            .save(path)
            .with_context(|| format!("writing class map {}", path.display()))?;
        info!(
            path = %path.display(),
            known,
            total = registry.class_map().len(),
            "class map saved"
        );
    }
    Ok(registry)
}

/// Spawn a player and `population` units and buildings on a ring. Units
/// alternate teams and fire at the centre; the first one is the player's.
///
/// # Errors
///
/// Fails if the catalog lacks one of the spawned kinds.
pub fn populate(groups: &mut EntityGroups, population: usize) -> anyhow::Result<EntityId> {
    let player = groups.create("player")?;
    if let Some(p) = groups.get_mut(player) {
        p.set("name", "host");
    }
    groups.add(player);

    let fire = [LValue::Num(0.0), LValue::Num(0.0), LValue::Num(1.0)];
    let mut controlled = false;

    for i in 0..population {
        #[allow(clippy::cast_precision_loss)]
        let angle = i as f32 / population as f32 * std::f32::consts::TAU;
        let team = i32::from(i % 2 == 1) + 1;
        let kind = if i % 4 == 3 { "building" } else { "unit" };

        let id = groups.create(kind)?;
        if let Some(e) = groups.get_mut(id) {
            e.set("pos", Vec2::from_angle(angle) * RING_RADIUS);
            e.set("team", team);
            if kind == "unit" && !controlled {
                e.set("controller", player);
                controlled = true;
            }
        }
        groups.add(id);

        if kind == "unit" {
            groups.control(id, LAccess::Shoot, &fire);
            if let Some(p) = groups.get_mut(player) {
                if !p.fields().entity("unit").is_valid() {
                    p.set("unit", id);
                }
            }
        }
    }

    info!(population, entities = groups.len(), "world populated");
    Ok(player)
}

/// Run the server loop to completion, sending snapshots to `wire`.
///
/// Blocks the calling thread.
///
/// # Errors
///
/// Fails if population or snapshot encoding fails.
pub fn run_server(
    config: &SimConfig,
    registry: Arc<KindRegistry>,
    wire: &mpsc::UnboundedSender<Vec<u8>>,
) -> anyhow::Result<ServerReport> {
    let mut groups = EntityGroups::new(registry);
    let player = populate(&mut groups, config.population)?;
    let local = LocalActor::new(player);

    let mut report = ServerReport::default();
    let mut failure = None;
    let interval = config.snapshot_interval;

    let mut server = TickLoop::new(config.tick_config(), groups)?;
    server.run_with(|sim| {
        if failure.is_some() || sim.tick_id() % interval != 0 {
            return;
        }
        let encoded = Snapshot::capture(sim.tick_id(), sim.groups().all()).and_then(|s| encode(&s));
        match encoded {
            Ok(bytes) => {
                report.snapshots += 1;
                report.last_snapshot = sim.groups().all().filter(|e| e.kind().serialize).count();
                report.bytes += bytes.len();
                debug!(tick_id = sim.tick_id(), bytes = bytes.len(), "snapshot sent");
                if wire.send(bytes).is_err() {
                    warn!(tick_id = sim.tick_id(), "mirror gone, snapshot dropped");
                }
            }
            Err(e) => failure = Some(e),
        }
    });
    if let Some(e) = failure {
        return Err(e).context("encoding snapshot");
    }

    report.ticks = server.tick_id();
    report.entities = server.groups().len();
    report.local = server.groups().all().filter(|e| local.is_local(e)).count();
    Ok(report)
}

/// Replace the mirror's world with the contents of one snapshot message.
///
/// Returns the number of instances handed over.
///
/// # Errors
///
/// Fails if the envelope does not decode or the mirror's inbox is closed.
/// Individual bad records are logged and skipped.
pub fn receive(
    registry: &KindRegistry,
    ids: &IdAllocator,
    remote: &RemoteSender,
    wire: &[u8],
) -> anyhow::Result<usize> {
    let snapshot: Snapshot = decode(wire)?;
    let decoded = snapshot.restore(registry, ids);
    let count = decoded.entities.len();

    remote.send(RemoteOp::Clear)?;
    for instance in decoded.entities {
        remote.send(RemoteOp::Spawn(Box::new(instance)))?;
    }
    debug!(
        tick_id = snapshot.tick_id,
        entities = count,
        dropped = decoded.failures.len(),
        "snapshot received"
    );
    Ok(count)
}

/// Receive snapshots until the server hangs up. Returns how many arrived.
pub async fn mirror(
    registry: Arc<KindRegistry>,
    ids: Arc<IdAllocator>,
    remote: RemoteSender,
    mut wire: mpsc::UnboundedReceiver<Vec<u8>>,
) -> u64 {
    let mut received = 0;
    while let Some(bytes) = wire.recv().await {
        match receive(&registry, &ids, &remote, &bytes) {
            Ok(_) => received += 1,
            Err(e) => warn!(error = %e, "dropping snapshot"),
        }
    }
    received
}
