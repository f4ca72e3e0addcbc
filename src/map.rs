//! # Map Synchronization
//!
//! Projects store entries onto map markers and popups, captures map clicks
//! as pending creation contexts, and pans the view to a selected workout.
//!
//! The map widget itself (tiles, DOM, animation) lives behind the
//! [`MapWidget`] trait; this module owns the synchronization rules, chief
//! among them that every workout receives exactly one marker placement per
//! session, at hydration or at creation, never both.

use std::collections::HashSet;

use crate::error::Result;
use crate::workout::{Workout, WorkoutKind};
use crate::GeoPoint;

/// Default map zoom level for workout focus.
pub const DEFAULT_ZOOM: u8 = 13;

/// Default pan animation duration in seconds.
pub const PAN_DURATION_S: f64 = 1.0;

// ============================================================================
// Map widget capability
// ============================================================================

/// Marker popup content: label text plus the workout kind for kind-specific
/// popup styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPopup {
    pub text: String,
    pub kind: WorkoutKind,
}

impl MarkerPopup {
    /// Build the popup for a workout: kind icon plus description.
    pub fn for_workout(workout: &Workout) -> Self {
        Self {
            text: workout.popup_label(),
            kind: workout.kind(),
        }
    }
}

/// Pan/zoom animation bounds for [`MapWidget::fly_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAnimation {
    pub animate: bool,
    pub duration_s: f64,
}

impl Default for PanAnimation {
    fn default() -> Self {
        Self {
            animate: true,
            duration_s: PAN_DURATION_S,
        }
    }
}

/// Capability the external map widget provides to the tracker core.
pub trait MapWidget {
    /// Place a marker with an attached popup at the given location.
    fn place_marker(&mut self, at: GeoPoint, popup: MarkerPopup) -> Result<()>;

    /// Re-center the view on a location with a bounded animation.
    fn fly_to(&mut self, center: GeoPoint, zoom: u8, animation: PanAnimation) -> Result<()>;
}

// ============================================================================
// Controller
// ============================================================================

/// Keeps map state in step with the workout store.
#[derive(Debug)]
pub struct MapSyncController {
    /// Click location awaiting a form submission.
    pending_click: Option<GeoPoint>,
    /// Ids that already have a marker this session.
    placed: HashSet<String>,
    zoom: u8,
}

impl Default for MapSyncController {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSyncController {
    /// Create a controller with the default zoom level.
    pub fn new() -> Self {
        Self::with_zoom(DEFAULT_ZOOM)
    }

    pub fn with_zoom(zoom: u8) -> Self {
        Self {
            pending_click: None,
            placed: HashSet::new(),
            zoom,
        }
    }

    /// Capture a map click as the pending creation context. A second click
    /// before submission replaces the first.
    pub fn on_map_clicked(&mut self, at: GeoPoint) {
        log::debug!(
            "map: click captured at ({}, {})",
            at.latitude,
            at.longitude
        );
        self.pending_click = Some(at);
    }

    /// The captured click location, if any, without consuming it.
    pub fn pending(&self) -> Option<GeoPoint> {
        self.pending_click
    }

    /// Take the captured click location, binding it to a new record.
    pub fn take_pending(&mut self) -> Option<GeoPoint> {
        self.pending_click.take()
    }

    /// Place the marker for a workout.
    ///
    /// Exactly-once per record per session: a repeated call for the same id
    /// is a logged no-op rather than a duplicate marker.
    pub fn render_marker(&mut self, workout: &Workout, widget: &mut dyn MapWidget) -> Result<()> {
        if !self.placed.insert(workout.id().to_string()) {
            log::debug!("map: marker for {} already placed, skipping", workout.id());
            return Ok(());
        }
        widget.place_marker(workout.coords(), MarkerPopup::for_workout(workout))
    }

    /// Re-center the map on a workout with the default animation.
    pub fn focus(&self, workout: &Workout, widget: &mut dyn MapWidget) -> Result<()> {
        widget.fly_to(workout.coords(), self.zoom, PanAnimation::default())
    }

    /// Number of markers placed this session.
    pub fn marker_count(&self) -> usize {
        self.placed.len()
    }

    /// Zoom level used for focus and initial centering.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

// ============================================================================
// Tests
// ============================================================================
