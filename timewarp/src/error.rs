//! Error types for the logical-process engine.

use thiserror::Error;
use timewarp_core::{ClientError, EffectError};

/// Errors surfaced by a logical process.
///
/// Protocol-internal races (stale anti-messages, merge ordering) are
/// resolved inside the engine and never appear here; what does appear
/// halts the process's tick loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A coordinator call failed, in transit or with an explicit error.
    #[error("coordinator call failed: {0}")]
    Client(#[from] ClientError),

    /// An event referenced an opcode this process has no handler for.
    #[error("effect dispatch failed: {0}")]
    Effect(#[from] EffectError),

    /// The process has not (or no longer) registered with the
    /// coordinator.
    #[error("logical process is not registered")]
    NotRegistered,
}
