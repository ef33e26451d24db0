//! Error taxonomy for transport and coordinator operations.
//!
//! Two failure domains are kept apart:
//! - [`TransportError`] — the RPC itself failed or timed out; halts the
//!   affected tick loop with no automatic retry.
//! - [`CoordinatorError`] — the coordinator processed the request and
//!   answered with an explicit not-found; never fatal to the coordinator.
//!
//! [`ClientError`] unifies the two for call sites, mirroring the split
//! between send-side and service-side failures.

use crate::types::LpId;
use thiserror::Error;

/// RPC-level failure between a logical process and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be delivered or the channel is gone.
    #[error("transport request failed: {0}")]
    Failed(String),

    /// The request did not complete within one tick interval.
    #[error("transport request timed out")]
    Timeout,
}

/// Explicit error answers from the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// `submit_event` named a destination no registered process owns.
    ///
    /// The sender logs and drops the event; there is no retry.
    #[error("unknown destination simulation: {0}")]
    UnknownDestination(String),

    /// An operation referenced an id that is not (or no longer) registered,
    /// e.g. a late `drain_events` after unregistration.
    #[error("no simulation registered with {0}")]
    MissingSimulation(LpId),
}

/// Unified error type for coordinator client calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The RPC failed in transit.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The coordinator answered with an explicit error.
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),
}

impl ClientError {
    /// True if this error is fatal to the caller's tick loop.
    ///
    /// Transport failures halt the loop until an external rejoin flow
    /// restarts it; coordinator lookups are surfaced to the caller but the
    /// protocol machinery stays up.
    pub fn halts_loop(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_from_transport() {
        let err: ClientError = TransportError::Timeout.into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.halts_loop());
    }

    #[test]
    fn test_client_error_from_coordinator() {
        let err: ClientError = CoordinatorError::UnknownDestination("ghost".to_string()).into();
        assert!(matches!(err, ClientError::Coordinator(_)));
        assert!(!err.halts_loop());
    }

    #[test]
    fn test_error_display() {
        let err = CoordinatorError::MissingSimulation(LpId::new(7));
        assert_eq!(err.to_string(), "no simulation registered with lp/7");
    }
}
