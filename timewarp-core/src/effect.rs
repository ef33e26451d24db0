//! Effect references, the effect registry, and emission collection.
//!
//! Events carry an [`EffectRef`] — an opcode plus opaque arguments — instead
//! of executable code. Every participating process registers the same
//! handlers in an [`EffectTable`] at startup and resolves received opcodes
//! through it, so nothing that arrives over the wire is ever executed as
//! code, only dispatched by name.
//!
//! # Architecture
//!
//! ```text
//! EventEnvelope { effect: EffectRef { opcode: "deposit", args: {...} } }
//!   ↓
//! table.apply(state, &effect, &mut ctx)
//!   ↓
//! registered handler:
//!   1. Read args from the EffectRef
//!   2. Mutate the state deterministically
//!   3. Emit follow-up events through the EffectContext
//! ```

use crate::time::VirtualTime;
use crate::types::Destination;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Portable reference to a registered effect.
///
/// The `opcode` selects a handler in the per-process [`EffectTable`]; the
/// `args` are an opaque payload the handler interprets. Both sides of a
/// send must register the opcode with identical semantics — the table is
/// part of the deployment contract, not of the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRef {
    /// Name of the registered handler to dispatch to.
    pub opcode: String,
    /// Opaque handler arguments.
    pub args: serde_json::Value,
}

impl EffectRef {
    /// Create an effect reference with arguments.
    pub fn new(opcode: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            opcode: opcode.into(),
            args,
        }
    }

    /// Create an effect reference without arguments.
    pub fn nullary(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            args: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for EffectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode)
    }
}

/// Errors raised by effect dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    /// No handler registered for the opcode.
    ///
    /// The effect table must be identical across all processes that can be
    /// a destination of the effect, so a miss is a deployment bug rather
    /// than a protocol race.
    #[error("unknown effect opcode: {0}")]
    UnknownOpcode(String),
}

/// A follow-up event produced while applying an effect.
///
/// Emissions are routed after the application completes: `Local` ones are
/// merged into the emitting process's own queue, remote ones are relayed
/// through the coordinator. Either way the engine records them so an exact
/// anti-message can be reconstructed on rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Where the event is routed.
    pub destination: Destination,
    /// Timestamp the event should be processed at.
    pub timestamp: VirtualTime,
    /// Effect the event applies on arrival.
    pub effect: EffectRef,
}

/// Collects the events an effect application schedules.
///
/// Handlers never touch the queue or the transport directly; they emit
/// through this context and the engine routes the batch afterwards. The
/// default destination is the one carried by the event being processed.
#[derive(Debug)]
pub struct EffectContext {
    default_destination: Destination,
    emissions: Vec<Emission>,
}

impl EffectContext {
    /// Create a context routing plain emissions to `default_destination`.
    pub fn new(default_destination: Destination) -> Self {
        Self {
            default_destination,
            emissions: Vec::new(),
        }
    }

    /// Schedule a follow-up event on the processing event's destination.
    pub fn emit(&mut self, timestamp: VirtualTime, effect: EffectRef) {
        let destination = self.default_destination.clone();
        self.emit_to(destination, timestamp, effect);
    }

    /// Schedule a follow-up event on an explicit destination.
    pub fn emit_to(&mut self, destination: Destination, timestamp: VirtualTime, effect: EffectRef) {
        self.emissions.push(Emission {
            destination,
            timestamp,
            effect,
        });
    }

    /// Number of emissions collected so far.
    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    /// True if no emissions were collected.
    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    /// Consume the context, yielding the collected emissions in order.
    pub fn into_emissions(self) -> Vec<Emission> {
        self.emissions
    }
}

/// Type-erased effect handler.
///
/// Mutates the state and may emit follow-up events; must be deterministic
/// in both for rollback to reproduce history faithfully.
pub type EffectFn<S> = Box<dyn Fn(&mut S, &EffectRef, &mut EffectContext)>;

/// Registry mapping effect opcodes to state-transition handlers.
///
/// Registered once at startup and shared by reference for the lifetime of
/// the process. Dispatch is by exact opcode match.
///
/// # Example
///
/// ```rust,ignore
/// let mut table = EffectTable::new();
/// table.register("deposit", |state: &mut Account, effect, _ctx| {
///     state.balance += effect.args["amount"].as_u64().unwrap_or(0);
/// });
/// ```
pub struct EffectTable<S> {
    handlers: HashMap<String, EffectFn<S>>,
}

impl<S> EffectTable<S> {
    /// Create an empty effect table.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an opcode.
    ///
    /// Re-registering an opcode replaces the previous handler.
    pub fn register<F>(&mut self, opcode: impl Into<String>, handler: F)
    where
        F: Fn(&mut S, &EffectRef, &mut EffectContext) + 'static,
    {
        let opcode = opcode.into();
        tracing::debug!(opcode = %opcode, "registering effect handler");
        self.handlers.insert(opcode, Box::new(handler));
    }

    /// Apply the effect referenced by `effect` to `state`.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::UnknownOpcode`] if no handler is registered
    /// for the opcode.
    pub fn apply(
        &self,
        state: &mut S,
        effect: &EffectRef,
        ctx: &mut EffectContext,
    ) -> Result<(), EffectError> {
        let handler = self
            .handlers
            .get(&effect.opcode)
            .ok_or_else(|| EffectError::UnknownOpcode(effect.opcode.clone()))?;
        handler(state, effect, ctx);
        Ok(())
    }

    /// Check if a handler exists for an opcode.
    pub fn has_handler(&self, opcode: &str) -> bool {
        self.handlers.contains_key(opcode)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<S> Default for EffectTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        value: i64,
    }

    fn table() -> EffectTable<Counter> {
        let mut table = EffectTable::new();
        table.register("add", |state: &mut Counter, effect, _ctx| {
            state.value += effect.args["n"].as_i64().unwrap_or(0);
        });
        table.register("echo", |_state, effect, ctx: &mut EffectContext| {
            ctx.emit(VirtualTime::new(10), effect.clone());
        });
        table
    }

    #[test]
    fn test_register_and_apply() {
        let table = table();
        assert_eq!(table.handler_count(), 2);
        assert!(table.has_handler("add"));

        let mut state = Counter { value: 1 };
        let mut ctx = EffectContext::new(Destination::Local);
        table
            .apply(&mut state, &EffectRef::new("add", json!({"n": 4})), &mut ctx)
            .expect("apply");
        assert_eq!(state.value, 5);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_unknown_opcode() {
        let table = table();
        let mut state = Counter { value: 0 };
        let mut ctx = EffectContext::new(Destination::Local);
        let err = table
            .apply(&mut state, &EffectRef::nullary("missing"), &mut ctx)
            .expect_err("should fail");
        assert_eq!(err, EffectError::UnknownOpcode("missing".to_string()));
    }

    #[test]
    fn test_context_collects_emissions() {
        let table = table();
        let mut state = Counter { value: 0 };
        let mut ctx = EffectContext::new(Destination::Lp("peer".to_string()));
        table
            .apply(&mut state, &EffectRef::nullary("echo"), &mut ctx)
            .expect("apply");

        let emissions = ctx.into_emissions();
        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].destination, Destination::Lp("peer".to_string()));
        assert_eq!(emissions[0].timestamp, VirtualTime::new(10));
    }

    #[test]
    fn test_emit_to_overrides_default() {
        let mut ctx = EffectContext::new(Destination::Local);
        ctx.emit_to(
            Destination::Lp("b".to_string()),
            VirtualTime::new(3),
            EffectRef::nullary("ping"),
        );
        ctx.emit(VirtualTime::new(4), EffectRef::nullary("pong"));

        let emissions = ctx.into_emissions();
        assert_eq!(emissions[0].destination, Destination::Lp("b".to_string()));
        assert_eq!(emissions[1].destination, Destination::Local);
    }

    #[test]
    fn test_effect_ref_serde_roundtrip() {
        let effect = EffectRef::new("transfer", json!({"from": "a", "to": "b", "amount": 7}));
        let json = serde_json::to_string(&effect).expect("serialize");
        let decoded: EffectRef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(effect, decoded);
    }
}
