//! Queue entries and their send records.

use timewarp_core::{Destination, EffectRef, EventEnvelope, VirtualTime};

/// Record of one sub-event an event's processing produced.
///
/// Kept on the producing event for as long as it stays processed, so that
/// a rollback can reconstruct the exact anti-message for every message the
/// speculation sent. Conservatively treated as outstanding for GVT until
/// the record itself is fossil-collected with its event.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessageRecord {
    /// Where the sub-event was routed.
    pub destination: Destination,
    /// Timestamp of the sub-event.
    pub timestamp: VirtualTime,
    /// Effect of the sub-event.
    pub effect: EffectRef,
}

impl SentMessageRecord {
    /// Consume the record, producing the matching anti-message and its
    /// destination.
    pub fn into_anti(self) -> (Destination, EventEnvelope) {
        (
            self.destination,
            EventEnvelope::anti_message(self.timestamp, self.effect),
        )
    }
}

/// One entry in a logical process's input queue.
///
/// # Lifecycle
///
/// ```text
/// Scheduled ──process──▶ Processed ──rollback──▶ Scheduled … ──▶ Collected
///     │                                                        (fossil)
///     └──anti-message──▶ Cancelled
/// ```
///
/// `previous_state` is the undo-log entry: populated exactly while
/// `processed` is true, cleared by rollback. `output_queue` accumulates a
/// [`SentMessageRecord`] per sub-event the processing emitted and is
/// drained when those sends are retracted.
#[derive(Debug, Clone)]
pub struct Event<S> {
    /// Virtual time this event is processed at.
    pub timestamp: VirtualTime,
    /// Effect applied when the event is processed.
    pub effect: EffectRef,
    /// Default destination for sub-events this event emits.
    pub destination: Destination,
    /// True while the event sits in the processed prefix of the queue.
    pub processed: bool,
    /// State snapshot taken immediately before this event was applied.
    pub previous_state: Option<S>,
    /// Send records for every sub-event this event's processing produced.
    pub output_queue: Vec<SentMessageRecord>,
}

impl<S> Event<S> {
    /// Create an unprocessed event whose emissions stay local.
    pub fn new(timestamp: VirtualTime, effect: EffectRef) -> Self {
        Self::routed(timestamp, effect, Destination::Local)
    }

    /// Create an unprocessed event with an explicit default destination
    /// for its emissions.
    pub fn routed(timestamp: VirtualTime, effect: EffectRef, destination: Destination) -> Self {
        Self {
            timestamp,
            effect,
            destination,
            processed: false,
            previous_state: None,
            output_queue: Vec::new(),
        }
    }

    /// True if this event has the given cancellation coordinates.
    pub fn matches(&self, timestamp: VirtualTime, effect: &EffectRef) -> bool {
        self.timestamp == timestamp && &self.effect == effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_is_unprocessed() {
        let event: Event<()> = Event::new(VirtualTime::new(1), EffectRef::nullary("noop"));
        assert!(!event.processed);
        assert!(event.previous_state.is_none());
        assert!(event.output_queue.is_empty());
        assert_eq!(event.destination, Destination::Local);
    }

    #[test]
    fn test_matches_ignores_destination() {
        let event: Event<()> = Event::routed(
            VirtualTime::new(4),
            EffectRef::nullary("x"),
            Destination::Lp("b".to_string()),
        );
        assert!(event.matches(VirtualTime::new(4), &EffectRef::nullary("x")));
        assert!(!event.matches(VirtualTime::new(5), &EffectRef::nullary("x")));
        assert!(!event.matches(VirtualTime::new(4), &EffectRef::nullary("y")));
    }

    #[test]
    fn test_record_into_anti() {
        let record = SentMessageRecord {
            destination: Destination::Lp("b".to_string()),
            timestamp: VirtualTime::new(4),
            effect: EffectRef::nullary("x"),
        };
        let (destination, envelope) = record.into_anti();
        assert_eq!(destination, Destination::Lp("b".to_string()));
        assert!(envelope.anti);
        assert_eq!(envelope.timestamp, VirtualTime::new(4));
    }
}
