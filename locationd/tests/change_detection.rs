//! End-to-end change detection against the in-memory bus.

use std::sync::Arc;

use locationd::bus::{EventKind, LocationEvent, MemoryBus};
use locationd::detector::ChangeDetector;
use locationd::fix::{Accuracy, Course, Fix, FixMode, FixTime, Position, Satellite, EPSILON};
use proptest::prelude::*;

fn detector() -> (ChangeDetector<MemoryBus>, Arc<MemoryBus>) {
    let bus = Arc::new(MemoryBus::new());
    (ChangeDetector::new(Arc::clone(&bus)), bus)
}

fn sat(prn: i16, used: bool) -> Satellite {
    Satellite {
        prn,
        elevation: 45.0,
        azimuth: 180.0,
        signal_strength: 30.0,
        used,
    }
}

#[tokio::test]
async fn test_acquisition_scenario() {
    let (mut detector, bus) = detector();

    // No fix yet; latitude unknown.
    let searching = Fix::unknown().with_mode(FixMode::NoFix);
    detector.observe(&searching).await;
    assert_eq!(bus.take(), vec![LocationEvent::FixStatusChanged(FixMode::NoFix)]);

    // 3D fix arrives.
    let fixed = Fix::unknown()
        .with_mode(FixMode::ThreeD)
        .with_position(Position::new(37.0, -122.0, 10.0));
    detector.observe(&fixed).await;
    assert_eq!(
        bus.take(),
        vec![
            LocationEvent::FixStatusChanged(FixMode::ThreeD),
            LocationEvent::PositionChanged(Position::new(37.0, -122.0, 10.0)),
        ]
    );

    // Identical sample.
    let report = detector.observe(&fixed).await;
    assert!(report.is_empty());
    assert!(bus.is_empty());
}

#[tokio::test]
async fn test_first_values_emit_once_per_group() {
    let (mut detector, bus) = detector();
    let fix = Fix::unknown()
        .with_mode(FixMode::ThreeD)
        .with_time(FixTime::new(1_700_000_000, 0))
        .with_position(Position::new(60.17, 24.94, 15.0))
        .with_course(Course::new(1.5, 90.0, 0.0))
        .with_accuracy(Accuracy {
            time: 0.005,
            vertical: 8.0,
            track: 2.0,
            speed: 0.3,
            climb: 0.5,
            horizontal: 4.0,
        })
        .with_satellites(vec![sat(3, true), sat(17, false)]);

    detector.observe(&fix).await;
    assert_eq!(
        bus.kinds(),
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

#[tokio::test]
async fn test_course_only_change() {
    let (mut detector, bus) = detector();
    let base = Fix::unknown()
        .with_mode(FixMode::TwoD)
        .with_position(Position::new(1.0, 2.0, f64::NAN))
        .with_course(Course::new(3.0, 45.0, f64::NAN));
    detector.observe(&base).await;
    bus.take();

    let turned = base.clone().with_course(Course::new(3.0, 50.0, f64::NAN));
    detector.observe(&turned).await;
    assert_eq!(bus.kinds(), vec![EventKind::Course]);
}

#[tokio::test]
async fn test_losing_position_emits_once() {
    let (mut detector, bus) = detector();
    let fixed = Fix::unknown()
        .with_mode(FixMode::ThreeD)
        .with_position(Position::new(37.0, -122.0, 10.0));
    let lost = Fix::unknown().with_mode(FixMode::ThreeD);

    detector.observe(&fixed).await;
    bus.take();

    detector.observe(&lost).await;
    assert_eq!(bus.kinds(), vec![EventKind::Position]);

    detector.observe(&lost).await;
    assert_eq!(bus.len(), 1);
}

#[tokio::test]
async fn test_satellite_reorder_republishes() {
    let (mut detector, bus) = detector();
    let sky = vec![sat(3, true), sat(17, false)];
    detector
        .observe(&Fix::unknown().with_satellites(sky.clone()))
        .await;
    bus.take();

    let reordered: Vec<_> = sky.into_iter().rev().collect();
    detector
        .observe(&Fix::unknown().with_satellites(reordered.clone()))
        .await;
    assert_eq!(bus.take(), vec![LocationEvent::SatellitesChanged(reordered)]);
}

#[tokio::test]
async fn test_failed_publish_is_not_retried() {
    let (mut detector, bus) = detector();
    let fix = Fix::unknown().with_mode(FixMode::TwoD);

    bus.fail_next(1);
    let report = detector.observe(&fix).await;
    assert_eq!(report.failed, vec![EventKind::FixStatus]);
    assert_eq!(report.delivered(), 0);

    let report = detector.observe(&fix).await;
    assert!(report.is_empty());
    assert!(bus.is_empty());
}

#[tokio::test]
async fn test_epsilon_boundary() {
    let lat = 37.0_f64;
    let (mut detector, bus) = detector();
    detector
        .observe(&Fix::unknown().with_position(Position::new(lat, 0.5, 1.0)))
        .await;
    bus.take();

    let jitter = lat * (1.0 + EPSILON / 2.0);
    detector
        .observe(&Fix::unknown().with_position(Position::new(jitter, 0.5, 1.0)))
        .await;
    assert!(bus.is_empty());

    let moved = lat * (1.0 + 2.0 * EPSILON);
    detector
        .observe(&Fix::unknown().with_position(Position::new(moved, 0.5, 1.0)))
        .await;
    assert_eq!(bus.kinds(), vec![EventKind::Position]);
}

fn position() -> impl Strategy<Value = Position> {
    (-90.0..90.0f64, -180.0..180.0f64, -500.0..9000.0f64)
        .prop_map(|(lat, lon, alt)| Position::new(lat, lon, alt))
}

proptest! {
    #[test]
    fn repeated_fix_emits_nothing(pos in position(), speed in 0.0..300.0f64) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let (mut detector, bus) = detector();
            let fix = Fix::unknown()
                .with_mode(FixMode::ThreeD)
                .with_position(pos)
                .with_course(Course::new(speed, 0.0, 0.0));

            detector.observe(&fix).await;
            let first = bus.len();
            detector.observe(&fix).await;
            prop_assert_eq!(bus.len(), first);
            Ok(())
        })?;
    }

    #[test]
    fn unknown_groups_never_fire(mode in 0i64..4) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let (mut detector, bus) = detector();
            detector
                .observe(&Fix::unknown().with_mode(FixMode::from_gpsd(mode)))
                .await;
            prop_assert!(bus
                .kinds()
                .iter()
                .all(|kind| *kind == EventKind::FixStatus));
            Ok(())
        })?;
    }
}
