//! Event funnel
//!
//! Many producers (one per watch adapter), one consumer (the processor).
//! Built on a bounded `tokio::sync::mpsc` channel. When the buffer is full
//! producers wait; events are never dropped.

use crate::apis::metrics::record_funnel_event;
use crate::error::ControllerError;
use common::{ObjectKey, ObjectKind};
use std::fmt;
use tokio::sync::mpsc;

/// What happened to the object behind an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Deleted,
}

impl Change {
    pub fn as_str(&self) -> &'static str {
        match self {
            Change::Applied => "applied",
            Change::Deleted => "deleted",
        }
    }
}

/// Processing request: which object to re-evaluate and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelEvent {
    pub key: ObjectKey,
    pub change: Change,
}

impl FunnelEvent {
    pub fn applied(key: ObjectKey) -> Self {
        Self {
            key,
            change: Change::Applied,
        }
    }

    pub fn deleted(key: ObjectKey) -> Self {
        Self {
            key,
            change: Change::Deleted,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.key.kind()
    }
}

impl fmt::Display for FunnelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.change.as_str(), self.key)
    }
}

/// What a producer does when the buffer is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressurePolicy {
    /// Wait for the consumer to make room
    #[default]
    Block,
}

/// Producer half. Clone one per adapter.
#[derive(Debug, Clone)]
pub struct FunnelSender {
    tx: mpsc::Sender<FunnelEvent>,
    policy: BackpressurePolicy,
}

/// Consumer half. Exactly one exists per funnel.
#[derive(Debug)]
pub struct FunnelReceiver {
    rx: mpsc::Receiver<FunnelEvent>,
}

/// Create a funnel holding at most `capacity` undelivered events.
///
/// `capacity` must be non-zero; [`ControllerConfig::validate`] rejects zero.
///
/// [`ControllerConfig::validate`]: crate::config::ControllerConfig::validate
pub fn channel(capacity: usize) -> (FunnelSender, FunnelReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        FunnelSender {
            tx,
            policy: BackpressurePolicy::Block,
        },
        FunnelReceiver { rx },
    )
}

impl FunnelSender {
    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Enqueue an event, waiting while the buffer is full.
    ///
    /// Fails only when the consumer is gone.
    pub async fn send(&self, event: FunnelEvent) -> Result<(), ControllerError> {
        let kind = event.kind();
        let change = event.change;
        match self.policy {
            BackpressurePolicy::Block => self
                .tx
                .send(event)
                .await
                .map_err(|_| ControllerError::FunnelClosed)?,
        }
        record_funnel_event(kind.as_str(), change.as_str());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl FunnelReceiver {
    /// Next event, or `None` once every sender is dropped and the buffer is
    /// drained
    pub async fn recv(&mut self) -> Option<FunnelEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for draining in tests
    pub fn try_recv(&mut self) -> Option<FunnelEvent> {
        self.rx.try_recv().ok()
    }

    /// Events currently buffered
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
