//! Gesture Reporter: maps a raw interaction lifecycle to side assignment and
//! streams position samples to the authority
//!
//! One reporter runs per participant interaction. It holds no gameplay state
//! of its own; its only outputs are commands on the authority link.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::AuthorityLink;
use crate::types::{AuthorityCommand, Side, Vec3};

/// Live position of a trackable point. The relay task reads this on every
/// sample; tests back it with a shared cell, a real integration backs it
/// with whatever the input layer provides.
pub trait PointSource: Send + Sync {
    fn position(&self) -> Vec3;
}

/// Shared mutable point, the simplest source
pub type SharedPoint = Arc<RwLock<Vec3>>;

impl PointSource for RwLock<Vec3> {
    fn position(&self) -> Vec3 {
        *self.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Tracks engagements for one participant and relays samples at a fixed
/// cadence while a side is held.
pub struct GestureReporter {
    link: Arc<dyn AuthorityLink>,
    /// Fixed reference anchors used to assign a side to a new engagement
    anchor_a: Vec3,
    anchor_b: Vec3,
    relay_interval: Duration,
    /// interaction id → side, fixed for the lifetime of the engagement
    engagements: HashMap<u64, Side>,
    /// At most one relay task per side
    relay_tasks: HashMap<Side, JoinHandle<()>>,
}

impl GestureReporter {
    pub fn new(
        link: Arc<dyn AuthorityLink>,
        anchor_a: Vec3,
        anchor_b: Vec3,
        relay_hz: f32,
    ) -> Self {
        Self {
            link,
            anchor_a,
            anchor_b,
            relay_interval: Duration::from_secs_f32(1.0 / relay_hz),
            engagements: HashMap::new(),
            relay_tasks: HashMap::new(),
        }
    }

    /// Side whose anchor is closer to `p`; ties favor A
    pub fn nearest_side(&self, p: Vec3) -> Side {
        if p.distance(&self.anchor_a) <= p.distance(&self.anchor_b) {
            Side::A
        } else {
            Side::B
        }
    }

    /// An interaction began on `point`. Assigns a side by nearest anchor,
    /// notifies the authority, and starts the periodic relay for that side.
    /// A prior relay task for the same side is stopped before the new one
    /// starts, so at most one exists per side.
    pub fn on_engage_start(&mut self, interaction_id: u64, point: Arc<dyn PointSource>) {
        let side = self.nearest_side(point.position());
        self.engagements.insert(interaction_id, side);
        debug!(interaction_id, side = %side, "engage");

        self.link.send(AuthorityCommand::Engaged { side });
        self.stop_relay(side);

        let link = Arc::clone(&self.link);
        let interval = self.relay_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                link.send(AuthorityCommand::Position {
                    side,
                    position: point.position(),
                });
            }
        });
        self.relay_tasks.insert(side, task);
    }

    /// An interaction ended. If the id maps to a known side, that side is
    /// released. If not, lifecycle tracking is inconsistent: release BOTH
    /// sides and stop all relays, favoring a false negative over a side
    /// stuck engaged forever.
    pub fn on_engage_end(&mut self, interaction_id: u64) {
        match self.engagements.remove(&interaction_id) {
            Some(side) => {
                debug!(interaction_id, side = %side, "disengage");
                self.stop_relay(side);
                self.link.send(AuthorityCommand::Disengaged { side });
            }
            None => {
                warn!(interaction_id, "disengage with no recorded side, releasing both");
                for side in Side::BOTH {
                    self.stop_relay(side);
                    self.link.send(AuthorityCommand::Disengaged { side });
                }
                self.engagements.clear();
            }
        }
    }

    /// Sides this reporter currently holds
    pub fn active_sides(&self) -> Vec<Side> {
        let mut sides: Vec<Side> = self.engagements.values().copied().collect();
        sides.sort_by_key(|s| s.index());
        sides.dedup();
        sides
    }

    fn stop_relay(&mut self, side: Side) {
        if let Some(task) = self.relay_tasks.remove(&side) {
            task.abort();
        }
    }
}

impl Drop for GestureReporter {
    fn drop(&mut self) {
        for (_, task) in self.relay_tasks.drain() {
            task.abort();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Captures every command instead of delivering it
    struct RecordingLink {
        sent: Mutex<Vec<AuthorityCommand>>,
    }

    impl RecordingLink {
        fn new() -> Arc<Self> {
            Arc::new(Self { sent: Mutex::new(Vec::new()) })
        }

        fn commands(&self) -> Vec<AuthorityCommand> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl AuthorityLink for RecordingLink {
        fn send(&self, cmd: AuthorityCommand) {
            self.sent.lock().unwrap().push(cmd);
        }
    }

    fn point_at(x: f32) -> SharedPoint {
        Arc::new(RwLock::new(Vec3::new(x, 0.0, 0.0)))
    }

    fn reporter(link: Arc<RecordingLink>) -> GestureReporter {
        GestureReporter::new(
            link,
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            30.0,
        )
    }

    #[test]
    fn test_nearest_side_tie_favors_a() {
        let rep = reporter(RecordingLink::new());
        assert_eq!(rep.nearest_side(Vec3::ZERO), Side::A);
        assert_eq!(rep.nearest_side(Vec3::new(-0.2, 0.0, 0.0)), Side::A);
        assert_eq!(rep.nearest_side(Vec3::new(0.2, 0.0, 0.0)), Side::B);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engage_notifies_and_relays() {
        let link = RecordingLink::new();
        let mut rep = reporter(Arc::clone(&link));

        rep.on_engage_start(7, point_at(-0.8));
        tokio::time::sleep(Duration::from_millis(80)).await;

        let cmds = link.commands();
        assert_eq!(cmds[0], AuthorityCommand::Engaged { side: Side::A });
        let samples = cmds
            .iter()
            .filter(|c| matches!(c, AuthorityCommand::Position { side: Side::A, .. }))
            .count();
        assert!(samples >= 2, "expected periodic samples, got {}", samples);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disengage_stops_relay_before_notifying() {
        let link = RecordingLink::new();
        let mut rep = reporter(Arc::clone(&link));

        rep.on_engage_start(7, point_at(0.9));
        tokio::time::sleep(Duration::from_millis(50)).await;
        rep.on_engage_end(7);

        let at_disengage = link.commands().len();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let cmds = link.commands();
        assert_eq!(
            cmds.last(),
            Some(&AuthorityCommand::Disengaged { side: Side::B })
        );
        assert_eq!(
            cmds.len(),
            at_disengage,
            "no samples may arrive after the disengage notification"
        );
        assert!(rep.active_sides().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_disengage_releases_both_sides() {
        let link = RecordingLink::new();
        let mut rep = reporter(Arc::clone(&link));

        rep.on_engage_start(1, point_at(-0.8));
        rep.on_engage_start(2, point_at(0.8));
        tokio::time::sleep(Duration::from_millis(40)).await;

        // Unknown interaction id: conservative recovery
        rep.on_engage_end(99);
        let cmds = link.commands();
        assert!(cmds.contains(&AuthorityCommand::Disengaged { side: Side::A }));
        assert!(cmds.contains(&AuthorityCommand::Disengaged { side: Side::B }));
        assert!(rep.active_sides().is_empty());

        let settled = link.commands().len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(link.commands().len(), settled, "all relays must be stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaiming_a_side_replaces_its_relay() {
        let link = RecordingLink::new();
        let mut rep = reporter(Arc::clone(&link));

        rep.on_engage_start(1, point_at(0.8));
        rep.on_engage_start(2, point_at(0.9)); // same side, new interaction
        tokio::time::sleep(Duration::from_millis(120)).await;
        rep.on_engage_end(2);

        let settled = link.commands().len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        // If the first task had survived, samples would keep arriving
        assert_eq!(
            link.commands().len(),
            settled,
            "only one relay task may exist per side"
        );
    }
}
