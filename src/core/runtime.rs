//! Authority runtime: serializes inbound commands with the evaluation tick
//!
//! The authority's state is only ever mutated here, from one execution
//! context. Commands that arrive between ticks sit in the queue until the
//! next evaluation drains them, so a mid-evaluation write is impossible.

use std::time::Instant;

use tokio::sync::mpsc;

use crate::core::{QueueLink, SqueezeAuthority};
use crate::types::{AuthorityCommand, SqueezeConfig, TickOutput};

/// Owns the authority plus its inbound command queue.
pub struct AuthorityRuntime {
    authority: SqueezeAuthority,
    rx: mpsc::UnboundedReceiver<AuthorityCommand>,
    started: Instant,
    last_tick: Option<f64>,
}

impl AuthorityRuntime {
    /// Create the runtime and the direct link feeding it
    pub fn new(config: SqueezeConfig) -> (Self, QueueLink) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            authority: SqueezeAuthority::new(config),
            rx,
            started: Instant::now(),
            last_tick: None,
        };
        (runtime, QueueLink::new(tx))
    }

    /// Seconds of session clock elapsed since construction
    pub fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Drain all buffered commands, then run one evaluation. Timestamps are
    /// explicit so a test harness can drive ticks deterministically.
    pub fn step(&mut self, now: f64, dt: f32) -> TickOutput {
        while let Ok(cmd) = self.rx.try_recv() {
            self.authority.apply(cmd, now);
        }
        self.last_tick = Some(now);
        self.authority.tick(now, dt)
    }

    /// One wall-clock tick, `dt` derived from the previous call
    pub fn tick(&mut self) -> TickOutput {
        let now = self.now();
        let dt = match self.last_tick {
            Some(prev) => (now - prev).max(0.0) as f32,
            None => 0.0,
        };
        self.step(now, dt)
    }

    pub fn authority(&self) -> &SqueezeAuthority {
        &self.authority
    }

    pub fn authority_mut(&mut self) -> &mut SqueezeAuthority {
        &mut self.authority
    }
}
