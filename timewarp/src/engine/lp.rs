//! The optimistic execution engine of a single logical process.
//!
//! A [`LogicalProcess`] owns one input queue and one state value, executes
//! events speculatively in local timestamp order, and repairs causality
//! violations after the fact: a straggler or anti-message rolls the
//! process back to the offending timestamp, retracting every message the
//! undone speculation sent by emitting matching anti-messages.
//!
//! One tick performs, in order:
//! 1. report the local GVT contribution and adopt the returned aggregate
//! 2. drain the coordinator mailbox and merge each envelope
//! 3. process the next unprocessed event, if any
//! 4. fossil-collect processed history below GVT
//!
//! The tick is cooperative and never re-entrant; all rollback activity
//! happens inside the merge step of the tick that received the straggler.

use std::collections::VecDeque;
use std::rc::Rc;

use timewarp_core::{
    ClientError, CoordinatorClient, CoordinatorError, Destination, EffectContext, EffectRef,
    EffectTable, EventEnvelope, LpId, Registration, SimulationState, VirtualTime,
};

use crate::engine::event::{Event, SentMessageRecord};
use crate::engine::queue::InputQueue;
use crate::error::EngineError;

/// A logical process: one independently clocked unit of the simulation.
///
/// Generic over the state it simulates and the client it reaches the
/// coordinator through, so the same engine runs against the in-process
/// channel in tests and a networked transport in production.
pub struct LogicalProcess<S, C> {
    client: C,
    name: String,
    registration: Option<Registration>,
    state: S,
    queue: InputQueue<S>,
    /// Anti-messages that arrived before their positive event.
    cancelled: Vec<EventEnvelope>,
    effects: Rc<EffectTable<S>>,
    gvt: VirtualTime,
}

impl<S, C> LogicalProcess<S, C>
where
    S: SimulationState,
    C: CoordinatorClient,
{
    /// Create a process with seed events and a shared effect table.
    ///
    /// Sharing one table between all local processes is the cheapest way
    /// to honor the requirement that every possible destination resolves
    /// an opcode identically.
    pub fn new(
        client: C,
        name: impl Into<String>,
        state: S,
        seed_events: Vec<Event<S>>,
        effects: Rc<EffectTable<S>>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            registration: None,
            state,
            queue: InputQueue::from_events(seed_events),
            cancelled: Vec::new(),
            effects,
            gvt: VirtualTime::ZERO,
        }
    }

    /// Registration name other processes address this one by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier allocated at registration, if registered.
    pub fn id(&self) -> Option<LpId> {
        self.registration.map(|r| r.id)
    }

    /// True if this process may issue the start command.
    pub fn is_admin(&self) -> bool {
        self.registration.map_or(false, |r| r.is_admin)
    }

    /// Current simulation state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Last aggregate GVT adopted from the coordinator.
    pub fn gvt(&self) -> VirtualTime {
        self.gvt
    }

    /// The input queue (read-only; mutation goes through the protocol).
    pub fn queue(&self) -> &InputQueue<S> {
        &self.queue
    }

    /// Anti-messages buffered against positive events that have not
    /// arrived yet.
    pub fn cancelled(&self) -> &[EventEnvelope] {
        &self.cancelled
    }

    /// Register with the coordinator under this process's name.
    ///
    /// Idempotent per instance: if already registered, returns the stored
    /// registration. A process that left rejoins as a brand-new
    /// registration with a fresh id.
    pub async fn register(&mut self) -> Result<Registration, EngineError> {
        if let Some(registration) = self.registration {
            return Ok(registration);
        }
        let registration = self.client.register(&self.name).await?;
        tracing::info!(
            lp = %self.name,
            id = %registration.id,
            is_admin = registration.is_admin,
            "registered"
        );
        self.registration = Some(registration);
        Ok(registration)
    }

    /// Voluntarily leave the simulation.
    ///
    /// Idempotent; after this the process must `register` again (getting a
    /// new id) before it can tick.
    pub async fn leave(&mut self) -> Result<(), EngineError> {
        if let Some(registration) = self.registration.take() {
            self.client.unregister(registration.id).await?;
            tracing::info!(lp = %self.name, id = %registration.id, "left simulation");
        }
        Ok(())
    }

    /// Issue the start command. Idempotent; gating on admin status is the
    /// election collaborator's job, not the engine's.
    pub async fn start(&self) -> Result<(), EngineError> {
        self.client.start().await?;
        Ok(())
    }

    /// True once the start barrier is open.
    pub async fn started(&self) -> Result<bool, EngineError> {
        Ok(self.client.started().await?)
    }

    /// Reset the state's logical clock to the origin.
    ///
    /// Called by the runner when a process (re)joins, before its first
    /// tick.
    pub fn reset_clock(&mut self) {
        self.state.set_time(VirtualTime::ZERO);
    }

    /// Add a locally created event, applying the straggler rule.
    ///
    /// If the event's timestamp precedes the queue tail this rolls back
    /// first and relays the resulting anti-messages, exactly as for an
    /// event received from the coordinator.
    pub async fn schedule(&mut self, event: Event<S>) -> Result<(), EngineError> {
        self.schedule_positive(event).await
    }

    /// Execute one cooperative tick.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRegistered`] before registration; transport and
    /// effect-dispatch failures propagate and halt the caller's loop.
    pub async fn tick(&mut self) -> Result<(), EngineError> {
        let registration = self.registration.ok_or(EngineError::NotRegistered)?;

        // 1. Contribute to GVT and adopt the aggregate.
        let local_min = self.local_min();
        self.gvt = self
            .client
            .report_local_min(registration.id, local_min)
            .await?;

        // 2. Drain and merge incoming events and anti-messages.
        let incoming = self.client.drain_events(registration.id).await?;
        for envelope in incoming {
            self.merge_envelope(envelope).await?;
        }

        // 3. Speculatively process the next event.
        self.process_next().await?;

        // 4. Discard history no rollback can reach anymore.
        let collected = self.queue.fossil_collect(self.gvt);
        if collected > 0 {
            tracing::debug!(lp = %self.name, collected, gvt = %self.gvt, "fossil collected");
        }

        Ok(())
    }

    /// This process's local contribution to GVT: the minimum over every
    /// queued timestamp and every still-outstanding sent message.
    ///
    /// Sent messages are conservatively treated as outstanding until their
    /// producing event is fossil-collected.
    pub fn local_min(&self) -> VirtualTime {
        let mut min = VirtualTime::MAX;
        for event in self.queue.entries() {
            min = min.min(event.timestamp);
            for record in &event.output_queue {
                min = min.min(record.timestamp);
            }
        }
        min
    }

    /// Merge one drained envelope per the Time Warp merge rule.
    async fn merge_envelope(&mut self, envelope: EventEnvelope) -> Result<(), EngineError> {
        if envelope.anti {
            let retractions = self.cancel_local(envelope.timestamp, envelope.effect);
            self.dispatch_anti_messages(retractions).await
        } else {
            // A buffered anti-message annihilates the event before it ever
            // enters the queue (message race, cheap path).
            if let Some(i) = self
                .cancelled
                .iter()
                .position(|anti| anti.cancels(&envelope))
            {
                self.cancelled.remove(i);
                tracing::debug!(lp = %self.name, %envelope, "annihilated with buffered anti-message");
                return Ok(());
            }
            self.schedule_positive(Event::new(envelope.timestamp, envelope.effect))
                .await
        }
    }

    /// Insert a positive event, rolling back first if it is a straggler.
    async fn schedule_positive(&mut self, event: Event<S>) -> Result<(), EngineError> {
        let straggler = self
            .queue
            .tail_timestamp()
            .map_or(false, |tail| event.timestamp < tail);

        if straggler {
            tracing::debug!(
                lp = %self.name,
                timestamp = %event.timestamp,
                effect = %event.effect,
                "straggler event, rolling back"
            );
            let retractions = self.rollback(event.timestamp);
            self.queue.insert_unprocessed(event);
            self.dispatch_anti_messages(retractions).await?;
        } else {
            self.queue.push_back(event);
        }
        Ok(())
    }

    /// Apply an anti-message locally.
    ///
    /// Cheap path: the positive event is still unprocessed and is simply
    /// removed. Expensive path: it was already processed, so its
    /// consequences are undone by rollback before removal. Race path:
    /// nothing matches yet, so the anti-message is buffered to suppress
    /// the positive event when it arrives.
    ///
    /// Returns the anti-messages any rollback produced; the caller relays
    /// them.
    fn cancel_local(
        &mut self,
        timestamp: VirtualTime,
        effect: EffectRef,
    ) -> Vec<(Destination, EventEnvelope)> {
        if let Some(i) = self.queue.find_unprocessed(timestamp, &effect) {
            self.queue.remove(i);
            tracing::debug!(lp = %self.name, %timestamp, %effect, "cancelled unprocessed event");
            return Vec::new();
        }

        if self.queue.find_processed(timestamp, &effect).is_some() {
            tracing::debug!(lp = %self.name, %timestamp, %effect, "cancelling processed event");
            let retractions = self.rollback(timestamp);
            // The target sits in the unprocessed suffix now.
            if let Some(i) = self.queue.find_unprocessed(timestamp, &effect) {
                self.queue.remove(i);
            }
            return retractions;
        }

        // Anti-message outran its positive event. Buffering is idempotent:
        // a retransmitted anti-message must not suppress two positives.
        let anti = EventEnvelope::anti_message(timestamp, effect);
        if !self.cancelled.iter().any(|existing| existing.cancels(&anti)) {
            tracing::debug!(lp = %self.name, %anti, "buffering early anti-message");
            self.cancelled.push(anti);
        }
        Vec::new()
    }

    /// Undo every processed event with `timestamp >= time`, most recent
    /// first.
    ///
    /// Reverse order is mandatory: each snapshot is only valid relative to
    /// the state that existed immediately before its event was applied.
    /// Every undone event's send records are drained into the returned
    /// retraction batch and its own output queue is left empty.
    fn rollback(&mut self, time: VirtualTime) -> Vec<(Destination, EventEnvelope)> {
        let mut retractions = Vec::new();
        let mut undone = 0usize;

        while self
            .queue
            .last_processed()
            .map_or(false, |event| event.timestamp >= time)
        {
            if let Some(event) = self.queue.retreat() {
                // Processed events always carry a snapshot.
                if let Some(snapshot) = event.previous_state.take() {
                    self.state = snapshot;
                }
                for record in event.output_queue.drain(..) {
                    retractions.push(record.into_anti());
                }
                event.processed = false;
                undone += 1;
            }
        }

        if undone > 0 {
            tracing::debug!(
                lp = %self.name,
                %time,
                undone,
                retractions = retractions.len(),
                "rolled back"
            );
        }
        retractions
    }

    /// Route a batch of anti-messages: local ones through the local
    /// cancellation path (which may cascade into further rollbacks),
    /// remote ones through the coordinator.
    async fn dispatch_anti_messages(
        &mut self,
        batch: Vec<(Destination, EventEnvelope)>,
    ) -> Result<(), EngineError> {
        let mut pending: VecDeque<_> = batch.into();
        while let Some((destination, envelope)) = pending.pop_front() {
            match destination {
                Destination::Local => {
                    let more = self.cancel_local(envelope.timestamp, envelope.effect);
                    pending.extend(more);
                }
                Destination::Lp(name) => self.relay(&name, envelope).await?,
            }
        }
        Ok(())
    }

    /// Relay an envelope to a named destination, dropping it (with a log)
    /// if the destination is unknown. Transport failures propagate.
    async fn relay(&self, destination: &str, envelope: EventEnvelope) -> Result<(), EngineError> {
        match self.client.submit_event(destination, envelope).await {
            Ok(()) => Ok(()),
            Err(ClientError::Coordinator(CoordinatorError::UnknownDestination(name))) => {
                tracing::warn!(lp = %self.name, destination = %name, "dropping envelope for unknown destination");
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Process the event at the cursor, if any: snapshot, advance the
    /// logical clock, apply the effect, record and route its emissions.
    async fn process_next(&mut self) -> Result<(), EngineError> {
        let Some(event) = self.queue.current() else {
            return Ok(());
        };
        let timestamp = event.timestamp;
        let effect = event.effect.clone();
        let destination = event.destination.clone();

        let snapshot = self.state.clone();
        self.state.set_time(timestamp);

        let mut ctx = EffectContext::new(destination);
        self.effects.apply(&mut self.state, &effect, &mut ctx)?;
        let emissions = ctx.into_emissions();

        if let Some(event) = self.queue.current_mut() {
            event.previous_state = Some(snapshot);
            event.processed = true;
            event.output_queue.extend(emissions.iter().map(|emission| {
                SentMessageRecord {
                    destination: emission.destination.clone(),
                    timestamp: emission.timestamp,
                    effect: emission.effect.clone(),
                }
            }));
        }
        self.queue.advance();

        tracing::debug!(
            lp = %self.name,
            %timestamp,
            %effect,
            emissions = emissions.len(),
            "processed event"
        );

        // Route emissions after the books are written: if a local
        // emission turns out to be a straggler, the rollback it triggers
        // finds complete send records and retracts them; a retraction
        // relayed before its positive is resolved by the receiver's
        // buffered-anti path.
        for emission in emissions {
            match emission.destination {
                Destination::Local => {
                    self.schedule_positive(Event::new(emission.timestamp, emission.effect))
                        .await?;
                }
                Destination::Lp(name) => {
                    self.relay(
                        &name,
                        EventEnvelope::event(emission.timestamp, emission.effect),
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }
}
