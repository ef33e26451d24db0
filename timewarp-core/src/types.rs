//! Identifier and addressing types.
//!
//! This module provides the fundamental addressing types for the protocol:
//! - [`LpId`]: coordinator-allocated identifier of a logical process
//! - [`Destination`]: where an emitted event is routed

use serde::{Deserialize, Serialize};

/// Identifier of a registered logical process.
///
/// Allocated by the coordinator as the smallest unused non-negative
/// integer, so identifiers are reused after unregistration. A process that
/// leaves and rejoins is a new registration with a new id.
///
/// # Examples
///
/// ```
/// use timewarp_core::LpId;
///
/// let id = LpId::new(0);
/// assert_eq!(id.as_u32(), 0);
/// assert_eq!(id.to_string(), "lp/0");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LpId(u32);

impl LpId {
    /// Create an identifier from its raw value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value of this identifier.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lp/{}", self.0)
    }
}

/// Routing target of an emitted event.
///
/// Logical processes address each other by registration *name*, not id:
/// names are stable across rejoin while ids are not. `Local` events skip
/// the coordinator entirely and go straight into the emitting process's own
/// input queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// The emitting process itself.
    Local,
    /// A remote logical process, addressed by registration name.
    Lp(String),
}

impl Destination {
    /// True if this destination is the emitting process itself.
    pub fn is_local(&self) -> bool {
        matches!(self, Destination::Local)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Local => write!(f, "local"),
            Destination::Lp(name) => write!(f, "{}", name),
        }
    }
}
