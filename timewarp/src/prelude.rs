//! Common imports for the timewarp framework.
//!
//! This module provides a convenient prelude for importing commonly used
//! types and traits.

pub use crate::engine::{Event, InputQueue, LogicalProcess, SentMessageRecord};
pub use crate::error::EngineError;
pub use crate::runtime::{null_render, CancellationToken, RenderSink, TickConfig, TickLoop};
pub use timewarp_coordinator::{Coordinator, LocalChannel};
pub use timewarp_core::{
    CoordinatorClient, Destination, EffectContext, EffectRef, EffectTable, EventEnvelope, LpId,
    Registration, SimulationState, TickClock, TokioClock, VirtualTime,
};

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use std::rc::Rc;
pub use std::time::Duration;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
