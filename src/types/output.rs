//! Per-tick evaluation output for display and live updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Result of one authority evaluation tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickOutput {
    /// Wall-clock timestamp
    pub timestamp: DateTime<Utc>,
    /// Current distance between the two sides, when both are valid
    pub distance: Option<f32>,
    /// rest_distance × squeeze_ratio, when a baseline exists
    pub threshold: Option<f32>,
    /// Whether the compression condition held this tick
    pub compressed: bool,
    /// Continuous compression time accumulated so far (seconds)
    pub sustain_s: f32,
    /// Time remaining before a new trigger may fire (seconds)
    pub cooldown_s: f32,
    /// Did this tick fire a trigger?
    pub fired: bool,
    /// Midpoint handed to the spawn sink when fired
    pub midpoint: Option<Vec3>,
}

impl TickOutput {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let (color, mark) = if self.fired {
            ("\x1b[32m", "*") // Green
        } else if self.compressed {
            ("\x1b[33m", "~") // Orange/Yellow
        } else {
            ("\x1b[90m", " ") // Gray
        };
        format!(
            "{}{} {} | sustain={:.2}s cd={:.2}s{}{}",
            color,
            mark,
            self.distance_summary(),
            self.sustain_s,
            self.cooldown_s,
            self.fired_summary(),
            "\x1b[0m",
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "{} | cmp={} | sustain={:.2}s | cd={:.2}s | fired={}",
            self.distance_summary(),
            self.compressed,
            self.sustain_s,
            self.cooldown_s,
            self.fired,
        )
    }

    fn distance_summary(&self) -> String {
        match (self.distance, self.threshold) {
            (Some(d), Some(t)) => format!("cur={:.3} thr={:.3}", d, t),
            (Some(d), None) => format!("cur={:.3} thr=--", d),
            _ => "cur=-- thr=--".to_string(),
        }
    }

    fn fired_summary(&self) -> String {
        match (self.fired, self.midpoint) {
            (true, Some(m)) => format!(" | FIRED at {}", m),
            _ => String::new(),
        }
    }
}
