//! # Timewarp Core
//!
//! Shared types and provider traits for the timewarp optimistic simulation
//! framework.
//!
//! This crate defines the seams the rest of the workspace plugs into:
//! - Virtual-time and identifier types used on every protocol surface
//! - The [`EffectTable`] registry that resolves portable effect references
//!   into deterministic state transitions
//! - The [`CoordinatorClient`] trait, the transport-agnostic RPC surface
//!   between a logical process and the coordinator
//! - The [`TickClock`] provider for pacing cooperative tick loops
//!
//! Higher layers live in `timewarp-coordinator` (the relay/GVT service) and
//! `timewarp` (the logical-process engine and runner).

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Abstract RPC surface between a logical process and the coordinator.
pub mod client;
/// Effect references, the effect registry, and emission collection.
pub mod effect;
/// Mailbox wire records exchanged through the coordinator.
pub mod envelope;
/// Error taxonomy for transport and coordinator operations.
pub mod error;
/// Simulation state seam for checkpointing and logical-clock updates.
pub mod state;
/// Virtual time and the tick-clock provider.
pub mod time;
/// Identifier and addressing types.
pub mod types;

pub use client::{CoordinatorClient, Registration};
pub use effect::{EffectContext, EffectError, EffectRef, EffectTable, Emission};
pub use envelope::EventEnvelope;
pub use error::{ClientError, CoordinatorError, TransportError};
pub use state::SimulationState;
pub use time::{TickClock, TimeError, TokioClock, VirtualTime};
pub use types::{Destination, LpId};
