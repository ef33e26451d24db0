//! Cooperative tick-loop runner.
//!
//! A [`TickLoop`] drives one [`LogicalProcess`] at a fixed wall-clock
//! interval: wait for the start barrier, then one tick per interval, each
//! followed by a render of the observed state. Every tick's coordinator
//! traffic is bounded by one interval; a transport failure or timeout
//! halts the loop with no automatic retry — rejoining through a fresh
//! registration is the recovery path.
//!
//! Stopping the loop is an explicit operation through its
//! [`CancellationToken`], not an exception.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use timewarp_core::{
    CoordinatorClient, SimulationState, TickClock, TimeError, TransportError,
};

use crate::engine::LogicalProcess;
use crate::error::EngineError;

/// Pacing configuration for a tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Wall-clock interval between ticks; also the per-tick deadline for
    /// coordinator traffic.
    pub tick_interval: Duration,
    /// Interval between `started()` polls while waiting on the barrier.
    pub start_poll_interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            start_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Simple cancellation token using `Rc<Cell<bool>>`.
///
/// All clones observe a cancel; `!Send`-compatible like the rest of the
/// cooperative runtime.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    /// Create a new token (not cancelled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Check if this token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// External rendering collaborator, invoked once per tick with the
/// current (possibly just-rolled-back) state.
pub trait RenderSink<S> {
    /// Observe the state after a tick.
    fn render(&mut self, state: &S);
}

impl<S, F> RenderSink<S> for F
where
    F: FnMut(&S),
{
    fn render(&mut self, state: &S) {
        self(state)
    }
}

/// Render sink that discards every observation.
///
/// Pass as `TickLoop::new(lp, clock, config, null_render)` when the
/// driving code has no rendering collaborator.
pub fn null_render<S>(_state: &S) {}

/// Drives one logical process at a fixed interval.
pub struct TickLoop<S, C, K, R> {
    lp: LogicalProcess<S, C>,
    clock: K,
    config: TickConfig,
    render: R,
    shutdown: CancellationToken,
}

impl<S, C, K, R> TickLoop<S, C, K, R>
where
    S: SimulationState,
    C: CoordinatorClient,
    K: TickClock,
    R: RenderSink<S>,
{
    /// Create a loop around a registered (or about-to-register) process.
    pub fn new(lp: LogicalProcess<S, C>, clock: K, config: TickConfig, render: R) -> Self {
        Self {
            lp,
            clock,
            config,
            render,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the loop at the next suspension point.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The driven process.
    pub fn lp(&self) -> &LogicalProcess<S, C> {
        &self.lp
    }

    /// Mutable access to the driven process.
    pub fn lp_mut(&mut self) -> &mut LogicalProcess<S, C> {
        &mut self.lp
    }

    /// Recover the process, e.g. to rejoin after a halt.
    pub fn into_inner(self) -> LogicalProcess<S, C> {
        self.lp
    }

    /// Poll the start barrier until it opens or the loop is cancelled.
    pub async fn wait_for_start(&mut self) -> Result<(), EngineError> {
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            let started = self
                .clock
                .timeout(self.config.start_poll_interval, self.lp.started())
                .await
                .map_err(elapsed_to_transport)??;
            if started {
                return Ok(());
            }
            self.clock.sleep(self.config.start_poll_interval).await;
        }
    }

    /// Run one tick, bounded by the tick interval, then render.
    pub async fn step(&mut self) -> Result<(), EngineError> {
        self.clock
            .timeout(self.config.tick_interval, self.lp.tick())
            .await
            .map_err(elapsed_to_transport)??;
        self.render.render(self.lp.state());
        Ok(())
    }

    /// Run until cancelled or halted by an error.
    ///
    /// Resets the state's logical clock first (a rejoining process starts
    /// over at the origin), waits on the start barrier, then ticks once
    /// per interval. Any error ends the loop; the caller decides whether
    /// to rejoin.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.lp.reset_clock();
        self.wait_for_start().await?;

        while !self.shutdown.is_cancelled() {
            if let Err(error) = self.step().await {
                tracing::error!(lp = %self.lp.name(), %error, "tick loop halted");
                return Err(error);
            }
            self.clock.sleep(self.config.tick_interval).await;
        }
        tracing::info!(lp = %self.lp.name(), "tick loop cancelled");
        Ok(())
    }
}

fn elapsed_to_transport(_: TimeError) -> EngineError {
    EngineError::Client(TransportError::Timeout.into())
}
