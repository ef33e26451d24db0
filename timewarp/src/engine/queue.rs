//! The timestamp-ordered input queue of a logical process.
//!
//! A flat vector sorted ascending by timestamp, partitioned by a cursor:
//! `[0, cursor)` is the processed prefix, `[cursor, len)` the unprocessed
//! suffix. Rollback only moves the cursor backwards, forward processing
//! advances it one event at a time, and fossil collection shrinks the
//! prefix from the front. A vector (rather than a heap) because rollback
//! and anti-message cancellation need indexed access to both partitions.

use timewarp_core::{EffectRef, VirtualTime};

use crate::engine::event::Event;

/// Ordered-by-timestamp event container with a processed/unprocessed
/// cursor. Owned exclusively by one logical process.
#[derive(Debug, Clone)]
pub struct InputQueue<S> {
    entries: Vec<Event<S>>,
    cursor: usize,
}

impl<S> Default for InputQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> InputQueue<S> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
        }
    }

    /// Create a queue from seed events, sorting them by timestamp.
    pub fn from_events(mut events: Vec<Event<S>>) -> Self {
        events.sort_by_key(|event| event.timestamp);
        Self {
            entries: events,
            cursor: 0,
        }
    }

    /// Number of entries, processed and unprocessed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index partitioning the processed prefix from the unprocessed
    /// suffix.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// All entries in timestamp order.
    pub fn entries(&self) -> &[Event<S>] {
        &self.entries
    }

    /// The processed prefix.
    pub fn processed(&self) -> &[Event<S>] {
        &self.entries[..self.cursor]
    }

    /// The unprocessed suffix.
    pub fn unprocessed(&self) -> &[Event<S>] {
        &self.entries[self.cursor..]
    }

    /// Timestamp of the last entry, if any.
    pub fn tail_timestamp(&self) -> Option<VirtualTime> {
        self.entries.last().map(|event| event.timestamp)
    }

    /// The next event to process, if any.
    pub fn current(&self) -> Option<&Event<S>> {
        self.entries.get(self.cursor)
    }

    /// Mutable access to the next event to process.
    pub fn current_mut(&mut self) -> Option<&mut Event<S>> {
        self.entries.get_mut(self.cursor)
    }

    /// Advance the cursor past the current event.
    ///
    /// The caller must have marked the event processed first.
    pub fn advance(&mut self) {
        debug_assert!(self.cursor < self.entries.len());
        debug_assert!(self.entries[self.cursor].processed);
        self.cursor += 1;
    }

    /// The most recently processed event, if any.
    pub fn last_processed(&self) -> Option<&Event<S>> {
        self.cursor.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Move the cursor back over the most recently processed event and
    /// hand it out for undoing.
    pub fn retreat(&mut self) -> Option<&mut Event<S>> {
        let i = self.cursor.checked_sub(1)?;
        self.cursor = i;
        Some(&mut self.entries[i])
    }

    /// Append an event whose timestamp is at or past the tail.
    pub fn push_back(&mut self, event: Event<S>) {
        debug_assert!(self
            .tail_timestamp()
            .map_or(true, |tail| event.timestamp >= tail));
        self.entries.push(event);
    }

    /// Insert an event at its sorted position in the unprocessed suffix,
    /// after any entries sharing its timestamp.
    pub fn insert_unprocessed(&mut self, event: Event<S>) {
        let offset = self.entries[self.cursor..]
            .iter()
            .position(|existing| existing.timestamp > event.timestamp)
            .unwrap_or(self.entries.len() - self.cursor);
        self.entries.insert(self.cursor + offset, event);
    }

    /// Index of the first unprocessed entry matching the cancellation
    /// coordinates.
    pub fn find_unprocessed(&self, timestamp: VirtualTime, effect: &EffectRef) -> Option<usize> {
        self.entries[self.cursor..]
            .iter()
            .position(|event| event.matches(timestamp, effect))
            .map(|offset| self.cursor + offset)
    }

    /// Index of the first processed entry matching the cancellation
    /// coordinates.
    pub fn find_processed(&self, timestamp: VirtualTime, effect: &EffectRef) -> Option<usize> {
        self.entries[..self.cursor]
            .iter()
            .position(|event| event.matches(timestamp, effect))
    }

    /// Remove and return the entry at `index`, which must lie in the
    /// unprocessed suffix.
    pub fn remove(&mut self, index: usize) -> Event<S> {
        debug_assert!(index >= self.cursor);
        self.entries.remove(index)
    }

    /// Discard every processed entry with a timestamp below `gvt`.
    ///
    /// Returns the number of entries collected. Unprocessed entries are
    /// never touched, whatever their timestamp.
    pub fn fossil_collect(&mut self, gvt: VirtualTime) -> usize {
        let mut collected = 0;
        let mut i = 0;
        while i < self.cursor {
            if self.entries[i].timestamp < gvt {
                self.entries.remove(i);
                self.cursor -= 1;
                collected += 1;
            } else {
                i += 1;
            }
        }
        collected
    }

    /// Minimum timestamp over all entries, [`VirtualTime::MAX`] if empty.
    pub fn min_timestamp(&self) -> VirtualTime {
        self.entries
            .iter()
            .map(|event| event.timestamp)
            .min()
            .unwrap_or(VirtualTime::MAX)
    }

    /// True if entries are sorted ascending by timestamp.
    ///
    /// The merge rules preserve this at every observable instant; exposed
    /// so tests can assert it.
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }
}
