//! Per-side hand tracking state, owned exclusively by the authority

use crate::types::Vec3;

/// Last known state of one tracked side.
///
/// A position is only trusted when the side is engaged AND the last accepted
/// sample is within the staleness window. Staleness is judged lazily at
/// evaluation time, never at write time.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandState {
    /// Last reported world position
    pub position: Vec3,
    /// Whether a reporter currently claims this side
    pub engaged: bool,
    /// Session-clock time of the last accepted sample (seconds)
    pub last_report: Option<f64>,
}

impl HandState {
    /// Record a position sample at `now`
    pub fn report(&mut self, position: Vec3, now: f64) {
        self.position = position;
        self.last_report = Some(now);
    }

    /// Valid iff engaged and the last sample is no older than `stale_window`
    pub fn is_valid(&self, now: f64, stale_window: f32) -> bool {
        self.engaged
            && matches!(self.last_report, Some(t) if now - t <= stale_window as f64)
    }
}
