//! The coordinator service.
//!
//! One coordinator instance owns all process-wide protocol state:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Coordinator                                 │
//! │                                             │
//! │  ┌───────────────────────────────────────┐  │
//! │  │ records: LpId → LpRecord              │  │
//! │  │   name, is_admin                      │  │
//! │  │   mailbox: Vec<EventEnvelope>         │  │
//! │  │   reported_min: VirtualTime           │  │
//! │  └───────────────────────────────────────┘  │
//! │                                             │
//! │  started: bool        (global start barrier)│
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All mutations run under a single interior-mutability cell, so a drain is
//! atomic with respect to submits and the GVT reduction always sees a
//! consistent snapshot of reports and in-flight mail.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use timewarp_core::{CoordinatorError, EventEnvelope, LpId, Registration, VirtualTime};

/// Per-process record held by the coordinator.
#[derive(Debug)]
struct LpRecord {
    /// Registration name; event routing is by name.
    name: String,
    /// True for the process that may issue the start command.
    is_admin: bool,
    /// Pending envelopes, in arrival order, removed exactly once on drain.
    mailbox: Vec<EventEnvelope>,
    /// Latest local GVT contribution reported by the process.
    reported_min: VirtualTime,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    records: BTreeMap<LpId, LpRecord>,
    started: bool,
}

/// Process-wide registry, relay and GVT service.
///
/// Cheap to clone; all clones share the same state. Mutating operations
/// each take the cell exactly once, which is what makes `drain_events`
/// atomic with respect to concurrent `submit_event` calls on a cooperative
/// runtime.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    state: Rc<RefCell<CoordinatorState>>,
}

impl Coordinator {
    /// Create a coordinator with an empty registry and a closed start
    /// barrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process under `name`, allocating the smallest unused id.
    ///
    /// The first registration into an empty registry is granted admin.
    /// Names are not required to be unique, but event routing picks the
    /// lowest-id match, so duplicate names shadow each other.
    pub fn register(&self, name: &str) -> Registration {
        let mut state = self.state.borrow_mut();

        let mut raw = 0u32;
        while state.records.contains_key(&LpId::new(raw)) {
            raw += 1;
        }
        let id = LpId::new(raw);
        let is_admin = state.records.is_empty();

        state.records.insert(
            id,
            LpRecord {
                name: name.to_string(),
                is_admin,
                mailbox: Vec::new(),
                reported_min: VirtualTime::ZERO,
            },
        );

        tracing::info!(%id, name, is_admin, "registered simulation");
        Registration { id, is_admin }
    }

    /// Remove a process and its mailbox. Idempotent.
    ///
    /// When the registry empties, the start barrier resets so the next
    /// cohort of registrations begins from a clean slate.
    pub fn unregister(&self, id: LpId) {
        let mut state = self.state.borrow_mut();
        if let Some(record) = state.records.remove(&id) {
            tracing::info!(%id, name = %record.name, was_admin = record.is_admin, "unregistered simulation");
        }
        if state.records.is_empty() {
            state.started = false;
        }
    }

    /// Open the start barrier. Idempotent.
    pub fn start(&self) {
        let mut state = self.state.borrow_mut();
        if !state.started {
            state.started = true;
            tracing::info!("simulation started");
        }
    }

    /// True once the start barrier is open.
    pub fn started(&self) -> bool {
        self.state.borrow().started
    }

    /// Append an envelope to the mailbox of the process registered under
    /// `destination`.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::UnknownDestination`] if no registered process
    /// carries that name.
    pub fn submit_event(
        &self,
        destination: &str,
        envelope: EventEnvelope,
    ) -> Result<(), CoordinatorError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .records
            .values_mut()
            .find(|record| record.name == destination)
            .ok_or_else(|| CoordinatorError::UnknownDestination(destination.to_string()))?;

        tracing::debug!(destination, %envelope, "relaying envelope");
        record.mailbox.push(envelope);
        Ok(())
    }

    /// Atomically take the full mailbox contents for `id`, in arrival
    /// order.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::MissingSimulation`] if `id` is not registered.
    pub fn drain_events(&self, id: LpId) -> Result<Vec<EventEnvelope>, CoordinatorError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .records
            .get_mut(&id)
            .ok_or(CoordinatorError::MissingSimulation(id))?;
        Ok(std::mem::take(&mut record.mailbox))
    }

    /// Record `value` as the latest contribution of `id` and recompute the
    /// global reduction.
    ///
    /// The reduction is the minimum over every registered process's last
    /// report and the timestamp of every envelope still sitting in any
    /// mailbox. In-flight mail must participate: without it an event could
    /// be fossil-collected on the sender's side before the receiver has
    /// seen it, leaving a later anti-message with nothing to cancel.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::MissingSimulation`] if `id` is not registered.
    pub fn report_local_min(
        &self,
        id: LpId,
        value: VirtualTime,
    ) -> Result<VirtualTime, CoordinatorError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .records
            .get_mut(&id)
            .ok_or(CoordinatorError::MissingSimulation(id))?;
        record.reported_min = value;

        let mut gvt = VirtualTime::MAX;
        for record in state.records.values() {
            gvt = gvt.min(record.reported_min);
            for envelope in &record.mailbox {
                gvt = gvt.min(envelope.timestamp);
            }
        }

        tracing::debug!(%id, reported = %value, %gvt, "gvt reduction");
        Ok(gvt)
    }

    /// Number of currently registered processes.
    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    /// True if no process is registered.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timewarp_core::EffectRef;

    fn envelope(ts: u64) -> EventEnvelope {
        EventEnvelope::event(VirtualTime::new(ts), EffectRef::nullary("noop"))
    }

    #[test]
    fn test_first_registration_is_admin() {
        let coordinator = Coordinator::new();

        let first = coordinator.register("producer");
        let second = coordinator.register("consumer");

        assert_eq!(first.id, LpId::new(0));
        assert!(first.is_admin);
        assert_eq!(second.id, LpId::new(1));
        assert!(!second.is_admin);
    }

    #[test]
    fn test_smallest_unused_id_is_reused() {
        let coordinator = Coordinator::new();

        let a = coordinator.register("a");
        let b = coordinator.register("b");
        coordinator.register("c");

        coordinator.unregister(a.id);
        let rejoin = coordinator.register("a-again");
        assert_eq!(rejoin.id, a.id);
        // Still the smallest: b's id was never freed.
        assert_ne!(rejoin.id, b.id);
    }

    #[test]
    fn test_rejoin_is_not_admin_while_others_remain() {
        let coordinator = Coordinator::new();
        let admin = coordinator.register("admin");
        coordinator.register("peer");

        coordinator.unregister(admin.id);
        let rejoined = coordinator.register("admin");
        assert!(!rejoined.is_admin);
    }

    #[test]
    fn test_start_barrier_resets_when_registry_empties() {
        let coordinator = Coordinator::new();
        let reg = coordinator.register("only");

        coordinator.start();
        assert!(coordinator.started());
        // Idempotent.
        coordinator.start();
        assert!(coordinator.started());

        coordinator.unregister(reg.id);
        assert!(!coordinator.started());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let coordinator = Coordinator::new();
        let reg = coordinator.register("solo");

        coordinator.unregister(reg.id);
        coordinator.unregister(reg.id);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_submit_unknown_destination() {
        let coordinator = Coordinator::new();
        coordinator.register("known");

        let err = coordinator
            .submit_event("ghost", envelope(1))
            .expect_err("should fail");
        assert_eq!(err, CoordinatorError::UnknownDestination("ghost".to_string()));
    }

    #[test]
    fn test_drain_clears_mailbox_exactly_once() {
        let coordinator = Coordinator::new();
        let reg = coordinator.register("sink");

        coordinator.submit_event("sink", envelope(3)).expect("submit");
        coordinator.submit_event("sink", envelope(1)).expect("submit");

        let drained = coordinator.drain_events(reg.id).expect("drain");
        // Arrival order, not timestamp order.
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].timestamp, VirtualTime::new(3));
        assert_eq!(drained[1].timestamp, VirtualTime::new(1));

        let again = coordinator.drain_events(reg.id).expect("drain");
        assert!(again.is_empty());
    }

    #[test]
    fn test_drain_unknown_id() {
        let coordinator = Coordinator::new();
        let err = coordinator
            .drain_events(LpId::new(9))
            .expect_err("should fail");
        assert_eq!(err, CoordinatorError::MissingSimulation(LpId::new(9)));
    }

    #[test]
    fn test_gvt_includes_in_flight_mail() {
        let coordinator = Coordinator::new();
        let lp1 = coordinator.register("lp1");
        let lp2 = coordinator.register("lp2");

        coordinator.submit_event("lp2", envelope(5)).expect("submit");

        coordinator
            .report_local_min(lp2.id, VirtualTime::new(7))
            .expect("report");
        let gvt = coordinator
            .report_local_min(lp1.id, VirtualTime::new(10))
            .expect("report");

        assert_eq!(gvt, VirtualTime::new(5));
    }

    #[test]
    fn test_gvt_non_decreasing_as_reports_accumulate() {
        let coordinator = Coordinator::new();
        let lp1 = coordinator.register("lp1");
        let lp2 = coordinator.register("lp2");

        let g1 = coordinator
            .report_local_min(lp1.id, VirtualTime::new(4))
            .expect("report");
        let g2 = coordinator
            .report_local_min(lp2.id, VirtualTime::new(6))
            .expect("report");
        let g3 = coordinator
            .report_local_min(lp1.id, VirtualTime::new(9))
            .expect("report");

        assert!(g2 >= g1);
        assert!(g3 >= g2);
        assert_eq!(g3, VirtualTime::new(6));
    }

    #[test]
    fn test_unregistered_lp_leaves_the_reduction() {
        let coordinator = Coordinator::new();
        let lp1 = coordinator.register("lp1");
        let lp2 = coordinator.register("lp2");

        coordinator
            .report_local_min(lp2.id, VirtualTime::new(2))
            .expect("report");
        coordinator.unregister(lp2.id);

        let gvt = coordinator
            .report_local_min(lp1.id, VirtualTime::new(8))
            .expect("report");
        assert_eq!(gvt, VirtualTime::new(8));

        let err = coordinator
            .report_local_min(lp2.id, VirtualTime::new(1))
            .expect_err("late report after unregister");
        assert_eq!(err, CoordinatorError::MissingSimulation(lp2.id));
    }

    #[test]
    fn test_idle_system_reduces_to_max() {
        let coordinator = Coordinator::new();
        let reg = coordinator.register("idle");

        let gvt = coordinator
            .report_local_min(reg.id, VirtualTime::MAX)
            .expect("report");
        assert_eq!(gvt, VirtualTime::MAX);
    }
}
