//! # Timewarp Coordinator
//!
//! The process-wide service side of the Time Warp protocol: a registry of
//! logical processes, one mailbox per process for event relay, the global
//! start barrier, and the GVT reduction that makes fossil collection safe.
//!
//! The coordinator itself is transport-agnostic. [`LocalChannel`] adapts a
//! shared [`Coordinator`] handle to the `CoordinatorClient` trait for
//! in-process simulations; a networked front end can expose the same
//! operations behind the same trait.

#![deny(missing_docs)]

/// The coordinator service: registry, mailboxes, start barrier, GVT.
pub mod coordinator;
/// In-process transport channel over a shared coordinator handle.
pub mod local;

pub use coordinator::Coordinator;
pub use local::LocalChannel;
