//! Abstract RPC surface between a logical process and the coordinator.
//!
//! The [`CoordinatorClient`] trait is the transport boundary of the
//! protocol: the engine only ever talks to the coordinator through it.
//! `timewarp-coordinator` ships an in-process implementation
//! (`LocalChannel`); a networked implementation slots in behind the same
//! trait without touching the engine.

use crate::envelope::EventEnvelope;
use crate::error::ClientError;
use crate::time::VirtualTime;
use crate::types::LpId;
use async_trait::async_trait;

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Identifier allocated to this process.
    pub id: LpId,
    /// True if this process was the first into an empty registry and may
    /// issue the start command.
    pub is_admin: bool,
}

/// Client side of the coordinator RPC surface.
///
/// All calls are request/response; outbound sends are fire-and-forget
/// relative to the tick beyond basic transport success. Implementations
/// must be cheap to clone — every logical process holds one.
#[async_trait(?Send)]
pub trait CoordinatorClient: Clone {
    /// Register a process under `name`.
    ///
    /// The first registration into an empty registry is granted admin.
    /// Registering again after a voluntary exit is a new registration and
    /// yields a fresh id.
    async fn register(&self, name: &str) -> Result<Registration, ClientError>;

    /// Remove a process and its mailbox. Idempotent under retransmission.
    async fn unregister(&self, id: LpId) -> Result<(), ClientError>;

    /// Open the start barrier. Idempotent; admin-initiated.
    async fn start(&self) -> Result<(), ClientError>;

    /// True once the start barrier is open.
    async fn started(&self) -> Result<bool, ClientError>;

    /// Relay an event or anti-message to the mailbox of the process
    /// registered under `destination`.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::UnknownDestination`] if no process is registered
    /// under that name.
    ///
    /// [`CoordinatorError::UnknownDestination`]: crate::error::CoordinatorError::UnknownDestination
    async fn submit_event(
        &self,
        destination: &str,
        envelope: EventEnvelope,
    ) -> Result<(), ClientError>;

    /// Atomically take the full mailbox contents for `id`.
    ///
    /// Entries are returned in arrival order and removed exactly once.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::MissingSimulation`] if `id` is not registered.
    ///
    /// [`CoordinatorError::MissingSimulation`]: crate::error::CoordinatorError::MissingSimulation
    async fn drain_events(&self, id: LpId) -> Result<Vec<EventEnvelope>, ClientError>;

    /// Report this process's local GVT contribution and receive the
    /// current global reduction.
    ///
    /// The returned value is a safe lower bound computed from the latest
    /// reports and all in-flight mailbox entries; it is non-decreasing as
    /// reports accumulate.
    async fn report_local_min(
        &self,
        id: LpId,
        value: VirtualTime,
    ) -> Result<VirtualTime, ClientError>;
}
