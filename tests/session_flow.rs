//! End-to-end session scenarios: pin drop, form submission, persistence and
//! map-marker synchronization across a simulated restart.

use waylog::{
    GeoPoint, MapWidget, MarkerPopup, MemorySlot, PanAnimation, PersistenceAdapter, Result,
    Session, StorageSlot, WorkoutForm, WorkoutKind, WORKOUTS_SLOT,
};

/// Map widget fake that records every marker placement and pan.
#[derive(Debug, Default)]
struct RecordingWidget {
    markers: Vec<(GeoPoint, MarkerPopup)>,
    pans: Vec<(GeoPoint, u8, PanAnimation)>,
}

impl MapWidget for RecordingWidget {
    fn place_marker(&mut self, at: GeoPoint, popup: MarkerPopup) -> Result<()> {
        self.markers.push((at, popup));
        Ok(())
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: u8, animation: PanAnimation) -> Result<()> {
        self.pans.push((center, zoom, animation));
        Ok(())
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn running_workout_from_pin_to_persisted_slot() {
    init_logging();
    let mut session = Session::new(PersistenceAdapter::new(MemorySlot::new()));
    let mut widget = RecordingWidget::default();
    session.hydrate(&mut widget).unwrap();

    let pin = GeoPoint::new(51.5, -0.12);
    session.map_clicked(pin);
    {
        let workout = session
            .submit(WorkoutForm::running(5.0, 25.0, 178.0), &mut widget)
            .unwrap();
        assert_eq!(workout.pace_min_per_km(), Some(5.0));
        assert!(workout.description().starts_with("Running on "));
        assert_eq!(workout.coords(), pin);
    }

    // exactly one marker, at the pinned location
    assert_eq!(widget.markers.len(), 1);
    assert_eq!(widget.markers[0].0, pin);
    assert_eq!(widget.markers[0].1.kind, WorkoutKind::Running);

    assert_eq!(session.store().len(), 1);

    // the persisted slot holds one entry with type "running"
    let blob = session
        .adapter()
        .slot()
        .read(WORKOUTS_SLOT)
        .unwrap()
        .expect("slot written");
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    let entries = value["workouts"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "running");
}

#[test]
fn cycling_workout_speed() {
    init_logging();
    let mut session = Session::new(PersistenceAdapter::new(MemorySlot::new()));
    let mut widget = RecordingWidget::default();
    session.hydrate(&mut widget).unwrap();

    session.map_clicked(GeoPoint::new(46.2, 6.14));
    let workout = session
        .submit(WorkoutForm::cycling(20.0, 60.0, 350.0), &mut widget)
        .unwrap();
    assert_eq!(workout.speed_km_per_h(), Some(20.0));
}

#[test]
fn restart_rehydrates_markers_exactly_once() {
    init_logging();
    let mut slot = MemorySlot::new();

    // first session: log two workouts
    {
        let mut session = Session::new(PersistenceAdapter::new(&mut slot));
        let mut widget = RecordingWidget::default();
        session.hydrate(&mut widget).unwrap();

        session.map_clicked(GeoPoint::new(51.5, -0.12));
        session
            .submit(WorkoutForm::running(5.0, 25.0, 178.0), &mut widget)
            .unwrap();
        session.map_clicked(GeoPoint::new(46.2, 6.14));
        session
            .submit(WorkoutForm::cycling(20.0, 60.0, 350.0), &mut widget)
            .unwrap();
        assert_eq!(widget.markers.len(), 2);
    }

    // restart: same slot, fresh session and map
    let mut session = Session::new(PersistenceAdapter::new(&mut slot));
    let mut widget = RecordingWidget::default();
    let count = session.hydrate(&mut widget).unwrap();
    assert_eq!(count, 2);

    // one marker per record after hydration, insertion order preserved
    assert_eq!(widget.markers.len(), 2);
    assert_eq!(session.map().marker_count(), 2);
    let kinds: Vec<WorkoutKind> = session.store().iter().map(|w| w.kind()).collect();
    assert_eq!(kinds, vec![WorkoutKind::Running, WorkoutKind::Cycling]);

    // adding one more places exactly one more marker
    session.map_clicked(GeoPoint::new(48.85, 2.35));
    session
        .submit(WorkoutForm::running(10.0, 50.0, 170.0), &mut widget)
        .unwrap();
    assert_eq!(widget.markers.len(), 3);
    assert_eq!(session.map().marker_count(), 3);
}

#[test]
fn unknown_kind_in_slot_is_skipped_on_hydration() {
    init_logging();
    let mut slot = MemorySlot::new();
    slot.write(
        WORKOUTS_SLOT,
        r#"{"version":1,"workouts":[
            {"id":"a","createdAt":"2024-08-09T12:00:00Z","coords":[51.5,-0.12],
             "distance":5.0,"duration":25.0,"type":"running","cadence":178.0},
            {"id":"b","createdAt":"2024-08-10T09:30:00Z","coords":[47.0,9.0],
             "distance":8.0,"duration":90.0,"type":"skiing"}
        ]}"#,
    )
    .unwrap();

    let mut session = Session::new(PersistenceAdapter::new(slot));
    let mut widget = RecordingWidget::default();
    let count = session.hydrate(&mut widget).unwrap();

    assert_eq!(count, 1);
    assert_eq!(session.store().len(), 1);
    assert_eq!(widget.markers.len(), 1);
    assert_eq!(widget.markers[0].1.kind, WorkoutKind::Running);
}

#[test]
fn reset_then_restart_is_empty() {
    init_logging();
    let mut slot = MemorySlot::new();

    {
        let mut session = Session::new(PersistenceAdapter::new(&mut slot));
        let mut widget = RecordingWidget::default();
        session.hydrate(&mut widget).unwrap();
        session.map_clicked(GeoPoint::new(51.5, -0.12));
        session
            .submit(WorkoutForm::running(5.0, 25.0, 178.0), &mut widget)
            .unwrap();
        session.reset_all().unwrap();
    }

    let mut session = Session::new(PersistenceAdapter::new(&mut slot));
    let mut widget = RecordingWidget::default();
    assert_eq!(session.hydrate(&mut widget).unwrap(), 0);
    assert!(session.store().is_empty());
    assert!(widget.markers.is_empty());
}
