//! Simulation state seam.

use crate::time::VirtualTime;

/// State a logical process owns and effects act upon.
///
/// The engine checkpoints state by cloning it before each speculative event
/// application and restores it by assignment on rollback, so `Clone` must
/// produce an exact, independent copy.
///
/// Implementations carry whatever domain data they like; the only
/// protocol-visible part is the logical clock, which the engine sets to the
/// timestamp of each event just before applying its effect.
pub trait SimulationState: Clone {
    /// Advance the state's logical clock to `time`.
    ///
    /// Called by the engine before every effect application, and with
    /// [`VirtualTime::ZERO`] when a process (re)joins a simulation.
    fn set_time(&mut self, time: VirtualTime);
}
