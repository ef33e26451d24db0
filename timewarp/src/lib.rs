//! # Timewarp
//!
//! Optimistic parallel discrete-event simulation in Rust, built around the
//! Time Warp synchronization protocol.
//!
//! Logical processes execute events speculatively in local timestamp
//! order and repair causality violations with rollback and anti-messages
//! instead of blocking on global synchronization. A coordinator relays
//! inter-process events and reduces a Global Virtual Time that bounds how
//! far any rollback can reach, so history below it can be discarded.
//!
//! ## Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              timewarp (this crate)                          │
//! │   LogicalProcess engine + TickLoop runner + re-exports      │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │  timewarp-coordinator    │  engine modules                  │
//! │  • LP registry + ids     │  • InputQueue (cursor, fossils)  │
//! │  • Mailbox relay         │  • rollback + anti-messages      │
//! │  • Start barrier         │  • speculative processing        │
//! │  • GVT reduction         │  • cancelled-queue races         │
//! ├──────────────────────────┴──────────────────────────────────┤
//! │                     timewarp-core                           │
//! │  VirtualTime, LpId, EffectRef/EffectTable, EventEnvelope,   │
//! │  CoordinatorClient trait, TickClock, error taxonomy         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timewarp::prelude::*;
//!
//! let coordinator = Coordinator::new();
//! let channel = LocalChannel::new(coordinator);
//!
//! let mut lp = LogicalProcess::new(channel, "producer", state, seeds, effects);
//! lp.register().await?;
//! lp.start().await?;
//! lp.tick().await?;
//! ```

#![deny(missing_docs)]

// Re-export all public items from sub-crates
pub use timewarp_coordinator::*;
pub use timewarp_core::*;

/// The optimistic execution engine: queue, rollback, anti-messages.
pub mod engine;
/// Engine error types.
pub mod error;
/// Common imports.
pub mod prelude;
/// Cooperative tick-loop runner and render collaborator seam.
pub mod runtime;
