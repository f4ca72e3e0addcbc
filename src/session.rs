//! # Session
//!
//! The explicit session context: one object owning the workout store, the
//! persistence adapter and the map-sync controller, threaded through the
//! event handlers instead of living as ambient global state.
//!
//! Lifecycle is a strict state machine: `Uninitialized → Hydrating → Ready`.
//! Hydration runs exactly once per session; there is no re-entry without a
//! new session. Within one handler invocation the ordering guarantee is
//! mutate, then persist, then render, so a crash between mutate and persist
//! loses at most the most recent record.
//!
//! The model is single-threaded and event-driven: every operation is one
//! non-overlapping handler invocation, and `&mut self` is the mutual
//! exclusion.

use crate::error::{Result, WaylogError};
use crate::map::{MapSyncController, MapWidget, PanAnimation};
use crate::persistence::{PersistenceAdapter, StorageSlot};
use crate::store::WorkoutStore;
use crate::workout::{Workout, WorkoutDetails, WorkoutId, WorkoutKind};
use crate::GeoPoint;

// ============================================================================
// External collaborators
// ============================================================================

/// One-shot position lookup, the geolocation boundary.
///
/// Denial or a missing platform capability maps to
/// [`WaylogError::GeolocationDenied`]; the session continues without map
/// centering. No retry policy and no timeout are applied here; a provider
/// implementation should bound its own wait.
pub trait GeolocationProvider {
    fn current_position(&self) -> Result<GeoPoint>;
}

/// Raw form submission values, the form-surface boundary.
///
/// The kind-specific field is optional at the surface (the form only shows
/// one of the two rows); [`Session::submit`] requires the one matching the
/// kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutForm {
    pub kind: WorkoutKind,
    pub distance_km: f64,
    pub duration_min: f64,
    pub cadence_spm: Option<f64>,
    pub elevation_gain_m: Option<f64>,
}

impl WorkoutForm {
    pub fn running(distance_km: f64, duration_min: f64, cadence_spm: f64) -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance_km,
            duration_min,
            cadence_spm: Some(cadence_spm),
            elevation_gain_m: None,
        }
    }

    pub fn cycling(distance_km: f64, duration_min: f64, elevation_gain_m: f64) -> Self {
        Self {
            kind: WorkoutKind::Cycling,
            distance_km,
            duration_min,
            cadence_spm: None,
            elevation_gain_m: Some(elevation_gain_m),
        }
    }

    /// Resolve the kind-specific detail block, requiring the matching field.
    fn details(&self) -> Result<WorkoutDetails> {
        match self.kind {
            WorkoutKind::Running => Ok(WorkoutDetails::Running {
                cadence_spm: self.cadence_spm.ok_or_else(|| {
                    WaylogError::validation("running workout requires a cadence")
                })?,
            }),
            WorkoutKind::Cycling => Ok(WorkoutDetails::Cycling {
                elevation_gain_m: self.elevation_gain_m.ok_or_else(|| {
                    WaylogError::validation("cycling workout requires an elevation gain")
                })?,
            }),
        }
    }
}

/// In-place edits to an existing workout's raw fields (the re-open flow).
/// Unset fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkoutEdit {
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub cadence_spm: Option<f64>,
    pub elevation_gain_m: Option<f64>,
}

// ============================================================================
// Session
// ============================================================================

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Hydrating,
    Ready,
}

/// A tracker session: store, persistence and map sync behind one context
/// object.
#[derive(Debug)]
pub struct Session<S: StorageSlot> {
    state: SessionState,
    store: WorkoutStore,
    adapter: PersistenceAdapter<S>,
    map: MapSyncController,
}

impl<S: StorageSlot> Session<S> {
    /// Create an uninitialized session over the given persistence adapter.
    pub fn new(adapter: PersistenceAdapter<S>) -> Self {
        Self {
            state: SessionState::Uninitialized,
            store: WorkoutStore::new(),
            adapter,
            map: MapSyncController::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub fn map(&self) -> &MapSyncController {
        &self.map
    }

    pub fn adapter(&self) -> &PersistenceAdapter<S> {
        &self.adapter
    }

    fn ensure_ready(&self, operation: &str) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(WaylogError::Lifecycle(format!(
                "{operation} requires a hydrated session (state is {:?})",
                self.state
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Hydrate the store from persisted state and place one marker per
    /// rehydrated record. Runs exactly once; a second call is a lifecycle
    /// error.
    pub fn hydrate(&mut self, widget: &mut dyn MapWidget) -> Result<usize> {
        if self.state != SessionState::Uninitialized {
            return Err(WaylogError::Lifecycle(
                "session is already hydrated".to_string(),
            ));
        }
        self.state = SessionState::Hydrating;

        let workouts = self.adapter.load()?;
        let count = workouts.len();
        for workout in workouts {
            self.map.render_marker(&workout, widget)?;
            self.store.add(workout);
        }

        self.state = SessionState::Ready;
        log::info!("session: hydrated {count} workouts");
        Ok(count)
    }

    /// Center the map on the user's position (session start).
    ///
    /// Geolocation denial surfaces as [`WaylogError::GeolocationDenied`];
    /// the session remains usable without centering.
    pub fn center_on_user(
        &self,
        provider: &dyn GeolocationProvider,
        widget: &mut dyn MapWidget,
    ) -> Result<GeoPoint> {
        let position = provider.current_position()?;
        widget.fly_to(
            position,
            self.map.zoom(),
            PanAnimation {
                animate: false,
                duration_s: 0.0,
            },
        )?;
        Ok(position)
    }

    // ========================================================================
    // Event handlers
    // ========================================================================

    /// Map click: capture the location as the pending creation context.
    pub fn map_clicked(&mut self, at: GeoPoint) {
        self.map.on_map_clicked(at);
    }

    /// Form submission: construct the record from the pending click and the
    /// form values, then add, persist and render in that strict order.
    ///
    /// On validation failure the pending click survives, mirroring the form
    /// staying open for correction.
    pub fn submit(&mut self, form: WorkoutForm, widget: &mut dyn MapWidget) -> Result<&Workout> {
        self.ensure_ready("submit")?;
        let coords = self.map.pending().ok_or_else(|| {
            WaylogError::Lifecycle("no map click pending; drop a pin before submitting".to_string())
        })?;

        let details = form.details()?;
        let workout = Workout::new(coords, form.distance_km, form.duration_min, details)?;

        // Construction succeeded: consume the click and run the
        // mutate -> persist -> render sequence.
        let _ = self.map.take_pending();
        let id = workout.id().clone();
        self.store.add(workout);
        self.adapter.save(&self.store)?;

        let added = self.store.find_by_id(&id)?;
        self.map.render_marker(added, widget)?;
        log::info!("session: logged {}", added);
        self.store.find_by_id(&id)
    }

    /// List click: look up the workout and pan the map to it.
    pub fn select(&mut self, id: &WorkoutId, widget: &mut dyn MapWidget) -> Result<&Workout> {
        self.ensure_ready("select")?;
        let workout = self.store.find_by_id(id)?;
        self.map.focus(workout, widget)?;
        Ok(workout)
    }

    /// Edit an existing workout's raw fields in place and persist.
    ///
    /// Changes apply atomically: a validation failure leaves the stored
    /// record untouched. Derived metrics refresh on their next access.
    pub fn edit(&mut self, id: &WorkoutId, changes: WorkoutEdit) -> Result<()> {
        self.ensure_ready("edit")?;

        let mut updated = self.store.find_by_id(id)?.clone();
        if let Some(distance_km) = changes.distance_km {
            updated.set_distance_km(distance_km)?;
        }
        if let Some(duration_min) = changes.duration_min {
            updated.set_duration_min(duration_min)?;
        }
        if let Some(cadence_spm) = changes.cadence_spm {
            updated.set_cadence_spm(cadence_spm)?;
        }
        if let Some(elevation_gain_m) = changes.elevation_gain_m {
            updated.set_elevation_gain_m(elevation_gain_m)?;
        }

        *self.store.find_by_id_mut(id)? = updated;
        self.adapter.save(&self.store)
    }

    /// Clear the store and remove the persisted slot.
    ///
    /// Already-rendered markers and list entries are untouched; the caller
    /// must reload the presentation layer.
    pub fn reset_all(&mut self) -> Result<()> {
        self.ensure_ready("reset_all")?;
        self.store.clear();
        self.adapter.reset()?;
        log::info!("session: cleared store and persisted slot");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
