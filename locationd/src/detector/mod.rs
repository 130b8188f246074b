//! Change detection and event publication.
//!
//! The [`ChangeDetector`] owns the [`PublishedState`] and turns each sampled
//! [`Fix`] into zero or more [`LocationEvent`]s. Six rules run on every
//! sample, independently of each other:
//!
//! ```text
//! Rule        Fires when                                   Compare
//! ──────────  ───────────────────────────────────────────  ──────────────
//! Status      mode differs                                 exact
//! Time        the source supplied a time this sample       none
//! Position    lat / lon / alt differ                       approx
//! Course      speed / track / climb differ                 approx
//! Accuracy    any of the six uncertainties differ          approx
//! Satellites  length or any element differs (by index)     exact + approx
//! ```
//!
//! "approx" is the relative-epsilon policy of [`crate::fix::approx_eq`], so
//! known→unknown and unknown→known transitions fire, while unknown→unknown
//! and noise-level jitter do not.
//!
//! # Delivery
//!
//! The held state for a group is updated before its event is handed to the
//! bus. A failed or timed-out publish is logged and is **not** rolled back:
//! an unchanged follow-up sample never re-emits the same event. Delivery is
//! best effort, at most once per change.
//!
//! Satellites are compared index by index, so a reordered but otherwise
//! identical sky view counts as a change and is republished.

mod state;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bus::{
    publish_with_timeout, EventBus, EventKind, LocationEvent, DEFAULT_PUBLISH_TIMEOUT,
};
use crate::fix::{ApproxEq, Fix};

pub use state::PublishedState;

/// Outcome of observing one fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveReport {
    /// Events emitted for this fix, in rule order.
    pub emitted: Vec<EventKind>,
    /// Subset of `emitted` the bus failed to deliver.
    pub failed: Vec<EventKind>,
}

impl ObserveReport {
    /// Number of events the bus accepted.
    pub fn delivered(&self) -> usize {
        self.emitted.len() - self.failed.len()
    }

    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }
}

/// Compares fixes against what was last published and emits the changes.
pub struct ChangeDetector<B: EventBus> {
    bus: Arc<B>,
    state: PublishedState,
    publish_timeout: Duration,
}

impl<B: EventBus> ChangeDetector<B> {
    /// Creates a detector with every group unknown.
    pub fn new(bus: Arc<B>) -> Self {
        Self {
            bus,
            state: PublishedState::new(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Sets the bound on each publish call.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Last published values.
    pub fn state(&self) -> &PublishedState {
        &self.state
    }

    /// Runs every rule against `fix` and publishes the resulting events.
    ///
    /// All rules are evaluated and the held state fully updated before the
    /// first publish, so no rule is ever half-applied.
    pub async fn observe(&mut self, fix: &Fix) -> ObserveReport {
        let events = self.detect_changes(fix);
        let mut report = ObserveReport::default();

        for event in &events {
            let kind = event.kind();
            report.emitted.push(kind);
            if let Err(e) = publish_with_timeout(&*self.bus, event, self.publish_timeout).await {
                warn!(signal = %kind, error = %e, "Failed to publish change");
                report.failed.push(kind);
            }
        }

        report
    }

    /// Applies the change rules, updating the held state, and returns the
    /// events to publish.
    pub fn detect_changes(&mut self, fix: &Fix) -> Vec<LocationEvent> {
        let mut events = Vec::new();
        let held = &mut self.state;

        if held.mode != fix.mode {
            debug!(from = %held.mode, to = %fix.mode, "Fix status changed");
            held.mode = fix.mode;
            events.push(LocationEvent::FixStatusChanged(fix.mode));
        }

        // Time advances every sample while fixed; no comparison.
        if let Some(time) = fix.time {
            held.time = Some(time);
            events.push(LocationEvent::TimeChanged(time));
        }

        // An all-unknown group equals an all-unknown held value, so only
        // groups with something known on either side can fire.
        if !held.position.approx_eq(&fix.position) {
            debug!(
                lat = fix.position.latitude,
                lon = fix.position.longitude,
                alt = fix.position.altitude,
                "Position changed"
            );
            held.position = fix.position;
            events.push(LocationEvent::PositionChanged(fix.position));
        }

        if !held.course.approx_eq(&fix.course) {
            debug!(
                speed = fix.course.speed,
                track = fix.course.track,
                climb = fix.course.climb,
                "Course changed"
            );
            held.course = fix.course;
            events.push(LocationEvent::CourseChanged(fix.course));
        }

        if !held.accuracy.approx_eq(&fix.accuracy) {
            debug!(accuracy = ?fix.accuracy.values(), "Accuracy changed");
            held.accuracy = fix.accuracy;
            events.push(LocationEvent::AccuracyChanged(fix.accuracy));
        }

        if !held.satellites.as_slice().approx_eq(fix.satellites.as_slice()) {
            debug!(
                visible = fix.satellites.len(),
                used = fix.satellites.iter().filter(|s| s.used).count(),
                "Satellite view changed"
            );
            held.satellites = fix.satellites.clone();
            events.push(LocationEvent::SatellitesChanged(fix.satellites.clone()));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryBus;
    use crate::fix::{Accuracy, Course, FixMode, FixTime, Position, Satellite, EPSILON};

    fn detector() -> (ChangeDetector<MemoryBus>, Arc<MemoryBus>) {
        let bus = Arc::new(MemoryBus::new());
        (ChangeDetector::new(Arc::clone(&bus)), bus)
    }

    fn kinds(events: &[LocationEvent]) -> Vec<EventKind> {
        events.iter().map(LocationEvent::kind).collect()
    }

    fn satellite(prn: i16, used: bool) -> Satellite {
        Satellite {
            prn,
            elevation: 40.0,
            azimuth: 100.0 + prn as f64,
            signal_strength: 35.0,
            used,
        }
    }

    fn full_fix() -> Fix {
        Fix::unknown()
            .with_mode(FixMode::ThreeD)
            .with_time(FixTime::new(1_600_000_000, 500))
            .with_position(Position::new(37.0, -122.0, 10.0))
            .with_course(Course::new(1.5, 270.0, 0.0))
            .with_accuracy(Accuracy {
                time: 0.005,
                vertical: 8.0,
                track: 10.0,
                speed: 0.3,
                climb: 1.0,
                horizontal: 4.0,
            })
            .with_satellites(vec![satellite(3, true), satellite(9, false)])
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let (detector, _) = detector();
        let state = detector.state();
        assert_eq!(state.mode, FixMode::NotSeen);
        assert!(state.time.is_none());
        assert!(!state.position.any_known());
        assert!(!state.course.any_known());
        assert!(!state.accuracy.any_known());
        assert!(state.satellites.is_empty());
    }

    #[test]
    fn test_first_fix_emits_every_known_group_once() {
        let (mut detector, _) = detector();
        let events = detector.detect_changes(&full_fix());

        assert_eq!(
            kinds(&events),
            vec![
                EventKind::FixStatus,
                EventKind::Time,
                EventKind::Position,
                EventKind::Course,
                EventKind::Accuracy,
                EventKind::Satellites,
            ]
        );
    }

    #[test]
    fn test_unknown_fix_emits_nothing() {
        let (mut detector, _) = detector();
        assert!(detector.detect_changes(&Fix::unknown()).is_empty());
    }

    #[test]
    fn test_repeat_only_emits_time() {
        let (mut detector, _) = detector();
        detector.detect_changes(&full_fix());
        let events = detector.detect_changes(&full_fix());
        assert_eq!(kinds(&events), vec![EventKind::Time]);
    }

    #[test]
    fn test_repeat_without_time_emits_nothing() {
        let (mut detector, _) = detector();
        let mut fix = full_fix();
        fix.time = None;
        detector.detect_changes(&fix);
        assert!(detector.detect_changes(&fix).is_empty());
    }

    #[test]
    fn test_time_always_emits_when_supplied() {
        let (mut detector, _) = detector();
        let fix = Fix::unknown().with_time(FixTime::new(10, 0));
        for _ in 0..3 {
            let events = detector.detect_changes(&fix);
            assert_eq!(events, vec![LocationEvent::TimeChanged(FixTime::new(10, 0))]);
        }
    }

    #[test]
    fn test_jitter_within_epsilon_is_suppressed() {
        let (mut detector, _) = detector();
        detector.detect_changes(&Fix::unknown().with_position(Position::new(37.0, -122.0, 10.0)));

        let jittered = Position::new(37.0 * (1.0 + EPSILON / 2.0), -122.0, 10.0);
        assert!(detector
            .detect_changes(&Fix::unknown().with_position(jittered))
            .is_empty());
        assert_eq!(detector.state().position.latitude, 37.0);
    }

    #[test]
    fn test_change_beyond_epsilon_emits() {
        let (mut detector, _) = detector();
        detector.detect_changes(&Fix::unknown().with_position(Position::new(37.0, -122.0, 10.0)));

        let moved = Position::new(37.0 * (1.0 + 2.0 * EPSILON), -122.0, 10.0);
        let events = detector.detect_changes(&Fix::unknown().with_position(moved));
        assert_eq!(events, vec![LocationEvent::PositionChanged(moved)]);
    }

    #[test]
    fn test_position_lost_emits_once() {
        let (mut detector, _) = detector();
        detector.detect_changes(&Fix::unknown().with_position(Position::new(37.0, -122.0, 10.0)));

        let lost = detector.detect_changes(&Fix::unknown());
        assert_eq!(kinds(&lost), vec![EventKind::Position]);
        assert!(!detector.state().position.any_known());

        assert!(detector.detect_changes(&Fix::unknown()).is_empty());
    }

    #[test]
    fn test_single_field_lost_emits() {
        let (mut detector, _) = detector();
        detector.detect_changes(&Fix::unknown().with_position(Position::new(37.0, -122.0, 10.0)));

        let events = detector.detect_changes(
            &Fix::unknown().with_position(Position::new(37.0, -122.0, f64::NAN)),
        );
        assert_eq!(kinds(&events), vec![EventKind::Position]);
    }

    #[test]
    fn test_partial_unknown_settles() {
        let (mut detector, _) = detector();
        let fix = Fix::unknown().with_position(Position::new(37.0, -122.0, f64::NAN));
        assert_eq!(kinds(&detector.detect_changes(&fix)), vec![EventKind::Position]);
        assert!(detector.detect_changes(&fix).is_empty());
    }

    #[test]
    fn test_course_change_is_independent() {
        let (mut detector, _) = detector();
        let mut fix = full_fix();
        fix.time = None;
        detector.detect_changes(&fix);

        fix.course = Course::new(2.5, 271.0, 0.0);
        let events = detector.detect_changes(&fix);
        assert_eq!(events, vec![LocationEvent::CourseChanged(fix.course)]);
    }

    #[test]
    fn test_accuracy_single_field_change() {
        let (mut detector, _) = detector();
        let mut fix = full_fix();
        fix.time = None;
        detector.detect_changes(&fix);

        fix.accuracy.horizontal = 12.0;
        assert_eq!(kinds(&detector.detect_changes(&fix)), vec![EventKind::Accuracy]);
    }

    #[test]
    fn test_status_compare_is_exact() {
        let (mut detector, _) = detector();
        let events = detector.detect_changes(&Fix::unknown().with_mode(FixMode::NoFix));
        assert_eq!(events, vec![LocationEvent::FixStatusChanged(FixMode::NoFix)]);

        let events = detector.detect_changes(&Fix::unknown().with_mode(FixMode::NotSeen));
        assert_eq!(events, vec![LocationEvent::FixStatusChanged(FixMode::NotSeen)]);
    }

    #[test]
    fn test_satellite_reorder_is_a_change() {
        let (mut detector, _) = detector();
        let sky = vec![satellite(3, true), satellite(9, false)];
        detector.detect_changes(&Fix::unknown().with_satellites(sky.clone()));

        let reordered = vec![sky[1], sky[0]];
        let events = detector.detect_changes(&Fix::unknown().with_satellites(reordered.clone()));
        assert_eq!(events, vec![LocationEvent::SatellitesChanged(reordered)]);
    }

    #[test]
    fn test_satellite_used_flag_change() {
        let (mut detector, _) = detector();
        detector.detect_changes(&Fix::unknown().with_satellites(vec![satellite(3, false)]));

        let events =
            detector.detect_changes(&Fix::unknown().with_satellites(vec![satellite(3, true)]));
        assert_eq!(kinds(&events), vec![EventKind::Satellites]);
    }

    #[test]
    fn test_satellites_dropping_to_empty_emits_empty_list() {
        let (mut detector, _) = detector();
        detector.detect_changes(&Fix::unknown().with_satellites(vec![satellite(3, true)]));

        let events = detector.detect_changes(&Fix::unknown());
        assert_eq!(events, vec![LocationEvent::SatellitesChanged(Vec::new())]);
    }

    #[tokio::test]
    async fn test_observe_publishes_in_rule_order() {
        let (mut detector, bus) = detector();
        let report = detector.observe(&full_fix()).await;

        assert_eq!(report.emitted.len(), 6);
        assert_eq!(report.delivered(), 6);
        assert_eq!(bus.kinds(), report.emitted);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_roll_back() {
        let (mut detector, bus) = detector();
        let fix = Fix::unknown().with_mode(FixMode::ThreeD);

        bus.fail_next(1);
        let report = detector.observe(&fix).await;
        assert_eq!(report.failed, vec![EventKind::FixStatus]);
        assert_eq!(report.delivered(), 0);
        assert_eq!(detector.state().mode, FixMode::ThreeD);

        let report = detector.observe(&fix).await;
        assert!(report.is_empty(), "failed event must not be retried");
        assert!(bus.is_empty());
    }

    #[tokio::test]
    async fn test_failure_in_one_group_does_not_block_others() {
        let (mut detector, bus) = detector();
        let fix = Fix::unknown()
            .with_mode(FixMode::TwoD)
            .with_position(Position::new(1.0, 2.0, f64::NAN));

        bus.fail_next(1);
        let report = detector.observe(&fix).await;
        assert_eq!(report.emitted, vec![EventKind::FixStatus, EventKind::Position]);
        assert_eq!(bus.kinds(), vec![EventKind::Position]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_timeout_counts_as_failure() {
        let bus = Arc::new(MemoryBus::with_delay(Duration::from_secs(10)));
        let mut detector =
            ChangeDetector::new(Arc::clone(&bus)).with_publish_timeout(Duration::from_millis(50));

        let report = detector
            .observe(&Fix::unknown().with_mode(FixMode::NoFix))
            .await;
        assert_eq!(report.failed, vec![EventKind::FixStatus]);
        assert_eq!(detector.state().mode, FixMode::NoFix);
    }
}
