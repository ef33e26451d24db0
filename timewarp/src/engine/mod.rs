//! The optimistic execution engine.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ LogicalProcess                                        │
//! │                                                       │
//! │  state ──────── checkpointed per speculative event    │
//! │                                                       │
//! │  InputQueue                                           │
//! │  ┌──────────────────────┬─────────────────────────┐   │
//! │  │ processed prefix     │ unprocessed suffix      │   │
//! │  │ (undo log attached)  │                         │   │
//! │  └──────────────────────┴─────────────────────────┘   │
//! │                        ▲ cursor                       │
//! │                                                       │
//! │  cancelled ──── anti-messages that outran their event │
//! └───────────────────────────────────────────────────────┘
//! ```

/// Queue entries and their send records.
pub mod event;
/// The logical-process engine itself.
pub mod lp;
/// The timestamp-ordered input queue.
pub mod queue;

pub use event::{Event, SentMessageRecord};
pub use lp::LogicalProcess;
pub use queue::InputQueue;
