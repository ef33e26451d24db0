//! Two logical processes playing a timestamped rally through the
//! in-process coordinator channel.
//!
//! `ping` serves; each volley counts a hit and returns the ball to the
//! other player a few virtual-time units later. Both processes run a real
//! tick loop, so the exchange exercises registration, the start barrier,
//! event relay and GVT reporting end to end.

use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use serde_json::json;
use timewarp::prelude::*;

#[derive(Debug, Clone)]
struct Rally {
    time: VirtualTime,
    hits: u64,
}

impl SimulationState for Rally {
    fn set_time(&mut self, time: VirtualTime) {
        self.time = time;
    }
}

fn volley(rally: &[&str], next: usize, step: u64) -> EffectRef {
    EffectRef::new("volley", json!({ "rally": rally, "next": next, "step": step }))
}

fn effects() -> Rc<EffectTable<Rally>> {
    let mut table = EffectTable::new();
    table.register("volley", |state: &mut Rally, effect, ctx: &mut EffectContext| {
        state.hits += 1;

        let rally = effect.args["rally"].clone();
        let next = effect.args["next"].as_u64().unwrap_or(0) as usize;
        let step = effect.args["step"].as_u64().unwrap_or(1);
        let to = rally[next].as_str().unwrap_or_default().to_string();

        let at = VirtualTime::new(state.time.ticks() + step);
        ctx.emit_to(
            Destination::Lp(to),
            at,
            EffectRef::new(
                "volley",
                json!({ "rally": rally, "next": (next + 1) % 2, "step": step }),
            ),
        );
    });
    Rc::new(table)
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to build runtime");

    runtime.block_on(async {
        let coordinator = Coordinator::new();
        let table = effects();

        let mut rng = rand::thread_rng();
        let serve_at = VirtualTime::new(rng.gen_range(1..4));
        let step = rng.gen_range(1..=3u64);
        let serve = Event::new(serve_at, volley(&["ping", "pong"], 1, step));

        let channel = LocalChannel::new(coordinator.clone());
        let mut ping = LogicalProcess::new(
            channel.clone(),
            "ping",
            Rally {
                time: VirtualTime::ZERO,
                hits: 0,
            },
            vec![serve],
            table.clone(),
        );
        let mut pong = LogicalProcess::new(
            channel,
            "pong",
            Rally {
                time: VirtualTime::ZERO,
                hits: 0,
            },
            vec![],
            table,
        );

        ping.register().await.expect("register ping");
        pong.register().await.expect("register pong");

        // First joiner is the admin and opens the barrier.
        assert!(ping.is_admin());
        ping.start().await.expect("start");

        let config = TickConfig {
            tick_interval: Duration::from_millis(25),
            start_poll_interval: Duration::from_millis(25),
        };

        let mut ping_loop = TickLoop::new(
            ping,
            TokioClock::new(),
            config.clone(),
            |state: &Rally| {
                tracing::info!(player = "ping", hits = state.hits, time = %state.time, "render");
            },
        );
        let mut pong_loop = TickLoop::new(
            pong,
            TokioClock::new(),
            config,
            |state: &Rally| {
                tracing::info!(player = "pong", hits = state.hits, time = %state.time, "render");
            },
        );

        let ping_token = ping_loop.shutdown_token();
        let pong_token = pong_loop.shutdown_token();

        let (ping_result, pong_result, ()) = tokio::join!(
            ping_loop.run(),
            pong_loop.run(),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                ping_token.cancel();
                pong_token.cancel();
            }
        );
        ping_result.expect("ping loop");
        pong_result.expect("pong loop");

        let mut ping = ping_loop.into_inner();
        let mut pong = pong_loop.into_inner();
        tracing::info!(
            ping_hits = ping.state().hits,
            pong_hits = pong.state().hits,
            "rally over"
        );

        ping.leave().await.expect("leave ping");
        pong.leave().await.expect("leave pong");
    });
}
