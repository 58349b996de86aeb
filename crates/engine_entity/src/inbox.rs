//! Hand-off of group mutations from other contexts.
//!
//! A network-receive task must never touch groups while a tick is running.
//! It sends [`RemoteOp`]s through a [`RemoteSender`] instead, and the tick
//! loop drains the [`RemoteInbox`] between ticks.

use engine_component::EntityId;
use tokio::sync::mpsc;

use crate::groups::EntityGroups;
use crate::instance::EntityInstance;

/// A group mutation requested from outside the simulation.
#[derive(Debug)]
pub enum RemoteOp {
    /// Insert and add a detached instance.
    Spawn(Box<EntityInstance>),
    /// Remove an added instance.
    Despawn(EntityId),
    /// Remove every instance.
    Clear,
}

/// The simulation side stopped listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("remote inbox closed")]
pub struct InboxClosed;

/// Cloneable sending half. Usable from any thread or task.
#[derive(Debug, Clone)]
pub struct RemoteSender {
    tx: mpsc::UnboundedSender<RemoteOp>,
}

impl RemoteSender {
    /// Queue an operation for the next tick boundary.
    ///
    /// # Errors
    ///
    /// Returns [`InboxClosed`] if the inbox was dropped.
    pub fn send(&self, op: RemoteOp) -> Result<(), InboxClosed> {
        self.tx.send(op).map_err(|_| InboxClosed)
    }
}

/// Receiving half, owned by the simulation.
#[derive(Debug)]
pub struct RemoteInbox {
    rx: mpsc::UnboundedReceiver<RemoteOp>,
}

impl RemoteInbox {
    /// Take every queued operation without waiting.
    pub fn drain(&mut self) -> Vec<RemoteOp> {
        let mut ops = Vec::new();
        while let Ok(op) = self.rx.try_recv() {
            ops.push(op);
        }
        ops
    }

    /// Apply every queued operation to `groups`, returning how many were
    /// applied.
    pub fn drain_into(&mut self, groups: &mut EntityGroups) -> usize {
        let ops = self.drain();
        let count = ops.len();
        for op in ops {
            groups.apply(op);
        }
        count
    }
}

/// Create a connected sender/inbox pair.
#[must_use]
pub fn remote_channel() -> (RemoteSender, RemoteInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RemoteSender { tx }, RemoteInbox { rx })
}
