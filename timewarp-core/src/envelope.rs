//! Mailbox wire records exchanged through the coordinator.

use crate::effect::EffectRef;
use crate::time::VirtualTime;
use serde::{Deserialize, Serialize};

/// One entry in a coordinator mailbox: a positive event or an anti-message.
///
/// An anti-message is structurally identical to the event it cancels plus
/// the `anti` flag; the receiving process matches the two on
/// `(timestamp, effect)`. Mailboxes preserve arrival order only — the
/// receiver re-sorts on merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Virtual time the event should be processed at.
    pub timestamp: VirtualTime,
    /// Effect the event applies on arrival.
    pub effect: EffectRef,
    /// True if this envelope cancels a previously sent event.
    pub anti: bool,
}

impl EventEnvelope {
    /// Create a positive event envelope.
    pub fn event(timestamp: VirtualTime, effect: EffectRef) -> Self {
        Self {
            timestamp,
            effect,
            anti: false,
        }
    }

    /// Create the anti-message for an event with the given coordinates.
    pub fn anti_message(timestamp: VirtualTime, effect: EffectRef) -> Self {
        Self {
            timestamp,
            effect,
            anti: true,
        }
    }

    /// True if `self` and `other` refer to the same event coordinates,
    /// ignoring the `anti` flag.
    pub fn cancels(&self, other: &EventEnvelope) -> bool {
        self.timestamp == other.timestamp && self.effect == other.effect
    }
}

impl std::fmt::Display for EventEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} @ {}",
            if self.anti { "anti:" } else { "" },
            self.effect,
            self.timestamp
        )
    }
}
