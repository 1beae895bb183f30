//! GripLock: server-authoritative two-hand squeeze gesture detection
//!
//! Data flow: GestureReporter → (engage / disengage / position relay) →
//! SqueezeAuthority → (on trigger) → SpawnSink

pub mod core;
pub mod types;

// =============================================================================
// DEFAULT TUNING [C] - From the reference rig
// =============================================================================

/// Squeeze fires when current distance <= rest distance × this ratio
pub const DEFAULT_SQUEEZE_RATIO: f32 = 0.75;

/// Compression must hold continuously this long before a trigger (seconds)
pub const DEFAULT_SUSTAIN_SECS: f32 = 0.15;

/// Minimum enforced interval between consecutive triggers (seconds)
pub const DEFAULT_COOLDOWN_SECS: f32 = 1.0;

/// A position report older than this is excluded from evaluation (seconds)
pub const DEFAULT_STALE_WINDOW_SECS: f32 = 0.25;

/// Cadence at which an engaged reporter relays position samples (Hz)
pub const DEFAULT_RELAY_HZ: f32 = 30.0;

/// Authority evaluation cadence when driven by the built-in server loop (Hz)
pub const DEFAULT_TICK_HZ: f32 = 60.0;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
