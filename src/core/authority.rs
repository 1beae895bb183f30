//! Squeeze Authority: hysteresis + debounce state machine
//!
//! Trigger condition, evaluated once per tick:
//! - both sides engaged with a fresh position sample (staleness window)
//! - current distance <= rest distance × squeeze_ratio
//! - held continuously for sustain_time
//! - cooldown fully elapsed (hard rate limit)
//!
//! The rest distance is captured at the first tick both sides are valid and
//! cleared whenever either side disengages. It is never reset by distance
//! fluctuation or staleness alone, so the gesture is measured relative to the
//! grip's own resting width rather than an absolute threshold.

use chrono::Utc;
use tracing::debug;

use crate::types::{AuthorityCommand, HandState, Side, SqueezeConfig, TickOutput, Vec3};

/// Receiver of trigger events. The authority makes no assumption about what
/// gets spawned; it only hands over the midpoint.
pub trait SpawnSink: Send {
    fn on_squeeze_triggered(&mut self, midpoint: Vec3);
}

impl<F: FnMut(Vec3) + Send> SpawnSink for F {
    fn on_squeeze_triggered(&mut self, midpoint: Vec3) {
        self(midpoint)
    }
}

/// The sole writer of hand state and the sole decision-maker for triggers.
///
/// Must only ever be mutated from one execution context. Remote participants
/// reach it through buffered commands applied between ticks; they never hold
/// a direct reference.
pub struct SqueezeAuthority {
    config: SqueezeConfig,
    hands: [HandState; 2],
    /// Baseline separation, set at the first dual-valid tick after any disengage
    rest_distance: Option<f32>,
    /// Continuous time the compressed condition has held (seconds)
    sustain: f32,
    /// Time remaining before a new trigger may fire (seconds)
    cooldown_remaining: f32,
    /// Triggers fired since construction
    trigger_count: u64,
    sink: Option<Box<dyn SpawnSink>>,
}

impl SqueezeAuthority {
    /// Create with the given tuning and no spawn sink
    pub fn new(config: SqueezeConfig) -> Self {
        Self {
            config,
            hands: [HandState::default(); 2],
            rest_distance: None,
            sustain: 0.0,
            cooldown_remaining: 0.0,
            trigger_count: 0,
            sink: None,
        }
    }

    /// Attach the spawn sink. Without one, triggers still evaluate and the
    /// cooldown still arms; only the side effect is skipped.
    pub fn set_sink(&mut self, sink: Box<dyn SpawnSink>) {
        self.sink = Some(sink);
    }

    /// Apply one buffered command at `now` (session-clock seconds)
    pub fn apply(&mut self, cmd: AuthorityCommand, now: f64) {
        match cmd {
            AuthorityCommand::Engaged { side } => self.set_engaged(side, true),
            AuthorityCommand::Disengaged { side } => self.set_engaged(side, false),
            AuthorityCommand::Position { side, position } => {
                self.set_position(side, position, now)
            }
        }
    }

    /// Mark a side engaged or released.
    ///
    /// Release clears the rest distance so the next dual-valid tick captures
    /// a fresh baseline instead of reusing a previous grip width.
    pub fn set_engaged(&mut self, side: Side, on: bool) {
        self.hands[side.index()].engaged = on;
        if !on {
            self.rest_distance = None;
        }
        debug!(side = %side, engaged = on, "engagement changed");
    }

    /// Record a position sample. Freshness is never validated here; staleness
    /// is judged lazily at evaluation time.
    pub fn set_position(&mut self, side: Side, position: Vec3, now: f64) {
        self.hands[side.index()].report(position, now);
    }

    /// One evaluation at `now`, with `dt` seconds elapsed since the previous
    /// tick. Driven by an external scheduler: a real-time loop, a timer, or a
    /// test harness stepping manually.
    pub fn tick(&mut self, now: f64, dt: f32) -> TickOutput {
        // Cooldown runs down regardless of validity
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);

        let a_valid = self.hands[Side::A.index()].is_valid(now, self.config.stale_window);
        let b_valid = self.hands[Side::B.index()].is_valid(now, self.config.stale_window);

        if !(a_valid && b_valid) {
            self.sustain = 0.0;
            // Staleness alone keeps the baseline; only a disengage drops it
            if !self.hands[Side::A.index()].engaged || !self.hands[Side::B.index()].engaged {
                self.rest_distance = None;
            }
            return self.output(None, false, false, None);
        }

        let a = self.hands[Side::A.index()].position;
        let b = self.hands[Side::B.index()].position;
        let current = a.distance(&b);

        // First dual-valid observation establishes the baseline
        let rest = *self.rest_distance.get_or_insert(current);

        let threshold = rest * self.config.squeeze_ratio;
        let compressed = current <= threshold;

        debug!(
            cur = current,
            thr = threshold,
            cmp = compressed,
            sustain = self.sustain,
            cd = self.cooldown_remaining,
            "tick"
        );

        let mut fired = false;
        let mut midpoint = None;
        if self.cooldown_remaining <= 0.0 && compressed {
            self.sustain += dt;
            if self.sustain >= self.config.sustain_time {
                self.sustain = 0.0;
                self.cooldown_remaining = self.config.cooldown;
                self.trigger_count += 1;
                let mid = a.midpoint(&b);
                fired = true;
                midpoint = Some(mid);
                if let Some(sink) = self.sink.as_mut() {
                    sink.on_squeeze_triggered(mid);
                }
            }
        } else {
            self.sustain = 0.0;
        }

        self.output(Some(current), compressed, fired, midpoint)
    }

    fn output(
        &self,
        distance: Option<f32>,
        compressed: bool,
        fired: bool,
        midpoint: Option<Vec3>,
    ) -> TickOutput {
        TickOutput {
            timestamp: Utc::now(),
            distance,
            threshold: self
                .rest_distance
                .map(|r| r * self.config.squeeze_ratio),
            compressed,
            sustain_s: self.sustain,
            cooldown_s: self.cooldown_remaining,
            fired,
            midpoint,
        }
    }

    /// Current tuning
    pub fn config(&self) -> &SqueezeConfig {
        &self.config
    }

    /// Whether a side is currently claimed
    pub fn engaged(&self, side: Side) -> bool {
        self.hands[side.index()].engaged
    }

    /// Baseline separation, if established
    pub fn rest_distance(&self) -> Option<f32> {
        self.rest_distance
    }

    /// Accumulated continuous compression time
    pub fn sustain_secs(&self) -> f32 {
        self.sustain
    }

    /// Time remaining on the trigger rate limit
    pub fn cooldown_secs(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Triggers fired since construction
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }
}

// =============================================================================
// TESTS
// =============================================================================
