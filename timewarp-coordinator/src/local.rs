//! In-process transport channel over a shared coordinator handle.
//!
//! `LocalChannel` is the simulation-grade implementation of the
//! `CoordinatorClient` seam: every logical process in the same runtime
//! holds a clone pointing at one shared [`Coordinator`]. Calls complete
//! immediately and never fail in transit, which makes protocol tests
//! deterministic.

use async_trait::async_trait;
use timewarp_core::{
    ClientError, CoordinatorClient, EventEnvelope, LpId, Registration, VirtualTime,
};

use crate::coordinator::Coordinator;

/// `CoordinatorClient` backed by an in-process [`Coordinator`].
#[derive(Debug, Clone)]
pub struct LocalChannel {
    coordinator: Coordinator,
}

impl LocalChannel {
    /// Create a channel to the given coordinator.
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    /// The coordinator this channel talks to.
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }
}

#[async_trait(?Send)]
impl CoordinatorClient for LocalChannel {
    async fn register(&self, name: &str) -> Result<Registration, ClientError> {
        Ok(self.coordinator.register(name))
    }

    async fn unregister(&self, id: LpId) -> Result<(), ClientError> {
        self.coordinator.unregister(id);
        Ok(())
    }

    async fn start(&self) -> Result<(), ClientError> {
        self.coordinator.start();
        Ok(())
    }

    async fn started(&self) -> Result<bool, ClientError> {
        Ok(self.coordinator.started())
    }

    async fn submit_event(
        &self,
        destination: &str,
        envelope: EventEnvelope,
    ) -> Result<(), ClientError> {
        self.coordinator
            .submit_event(destination, envelope)
            .map_err(ClientError::from)
    }

    async fn drain_events(&self, id: LpId) -> Result<Vec<EventEnvelope>, ClientError> {
        self.coordinator.drain_events(id).map_err(ClientError::from)
    }

    async fn report_local_min(
        &self,
        id: LpId,
        value: VirtualTime,
    ) -> Result<VirtualTime, ClientError> {
        self.coordinator
            .report_local_min(id, value)
            .map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timewarp_core::{CoordinatorError, EffectRef};

    #[tokio::test]
    async fn test_channel_round_trip() {
        let coordinator = Coordinator::new();
        let channel = LocalChannel::new(coordinator);

        let reg = channel.register("alpha").await.expect("register");
        assert!(reg.is_admin);

        channel.start().await.expect("start");
        assert!(channel.started().await.expect("started"));

        channel
            .submit_event(
                "alpha",
                EventEnvelope::event(VirtualTime::new(2), EffectRef::nullary("noop")),
            )
            .await
            .expect("submit");

        let drained = channel.drain_events(reg.id).await.expect("drain");
        assert_eq!(drained.len(), 1);

        channel.unregister(reg.id).await.expect("unregister");
        assert!(!channel.started().await.expect("started"));
    }

    #[tokio::test]
    async fn test_channel_surfaces_coordinator_errors() {
        let channel = LocalChannel::new(Coordinator::new());

        let err = channel
            .drain_events(LpId::new(0))
            .await
            .expect_err("should fail");
        assert_eq!(
            err,
            ClientError::Coordinator(CoordinatorError::MissingSimulation(LpId::new(0)))
        );
        assert!(!err.halts_loop());
    }
}
