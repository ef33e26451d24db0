//! Shared fixtures for the protocol integration tests.
//!
//! `GridState` is a deliberately small simulation state: a running total
//! plus an application log, so tests can assert both the value and the
//! exact order effects were (re)applied in.

#![allow(dead_code)]

use std::rc::Rc;

use serde_json::json;
use timewarp::prelude::*;

/// Test state: a counter with an application log.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    pub time: VirtualTime,
    pub total: i64,
    /// `(timestamp, amount)` per applied `add`, in application order.
    pub log: Vec<(u64, i64)>,
}

impl GridState {
    pub fn new() -> Self {
        Self {
            time: VirtualTime::ZERO,
            total: 0,
            log: Vec::new(),
        }
    }
}

impl SimulationState for GridState {
    fn set_time(&mut self, time: VirtualTime) {
        self.time = time;
    }
}

/// Effect table shared by every process in a test.
///
/// - `add {n}`: adds `n` to the total and logs `(state.time, n)`.
/// - `relay {at, n}`: emits an `add {n}` at virtual time `at` to the
///   processing event's destination.
pub fn effects() -> Rc<EffectTable<GridState>> {
    let mut table = EffectTable::new();
    table.register("add", |state: &mut GridState, effect, _ctx| {
        let n = effect.args["n"].as_i64().unwrap_or(0);
        state.total += n;
        let at = state.time.ticks();
        state.log.push((at, n));
    });
    table.register("relay", |_state, effect, ctx: &mut EffectContext| {
        let at = effect.args["at"].as_u64().unwrap_or(0);
        let n = effect.args["n"].as_i64().unwrap_or(0);
        ctx.emit(VirtualTime::new(at), add_effect(n));
    });
    Rc::new(table)
}

pub fn add_effect(n: i64) -> EffectRef {
    EffectRef::new("add", json!({ "n": n }))
}

pub fn add_event(ts: u64, n: i64) -> Event<GridState> {
    Event::new(VirtualTime::new(ts), add_effect(n))
}

pub fn relay_event(ts: u64, to: &str, at: u64, n: i64) -> Event<GridState> {
    Event::routed(
        VirtualTime::new(ts),
        EffectRef::new("relay", json!({ "at": at, "n": n })),
        Destination::Lp(to.to_string()),
    )
}

/// A process wired to the given coordinator, seeded and registered.
pub async fn spawn_lp(
    coordinator: &Coordinator,
    name: &str,
    seeds: Vec<Event<GridState>>,
) -> LogicalProcess<GridState, LocalChannel> {
    let channel = LocalChannel::new(coordinator.clone());
    let mut lp = LogicalProcess::new(channel, name, GridState::new(), seeds, effects());
    lp.register().await.expect("register");
    lp
}
