//! # Waylog
//!
//! Map-pinned workout tracking: a user drops a pin on a map, enters exercise
//! parameters, and waylog derives the performance metric, persists the record
//! and keeps the map markers in sync with the stored workouts.
//!
//! This library is the tracker core:
//! - Workout domain model with derived metrics (pace, speed, description)
//! - Ordered in-memory workout store
//! - Whole-store persistence to a single durable storage slot
//! - Map synchronization contract (markers, popups, pan-to-workout)
//!
//! Map tiles, form widgets and geolocation prompts are external collaborators
//! behind the [`MapWidget`] and [`GeolocationProvider`] traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use waylog::{GeoPoint, Workout, WorkoutDetails};
//!
//! let run = Workout::new(
//!     GeoPoint::new(51.5074, -0.1278), // London
//!     5.0,  // km
//!     25.0, // min
//!     WorkoutDetails::Running { cadence_spm: 178.0 },
//! )
//! .unwrap();
//!
//! assert_eq!(run.pace_min_per_km(), Some(5.0));
//! assert!(run.description().starts_with("Running on"));
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, WaylogError};

// Workout domain model (tagged union, derived metrics, identity)
pub mod workout;
pub use workout::{StoredWorkout, Workout, WorkoutDetails, WorkoutId, WorkoutKind};

// Ordered in-memory workout collection
pub mod store;
pub use store::WorkoutStore;

// Durable storage slot boundary and whole-store blob persistence
pub mod persistence;
pub use persistence::{
    FileSlot, MemorySlot, PersistenceAdapter, StorageSlot, SCHEMA_VERSION, WORKOUTS_SLOT,
};

// Map synchronization (markers, popups, pending click capture)
pub mod map;
pub use map::{MapSyncController, MapWidget, MarkerPopup, PanAnimation, DEFAULT_ZOOM, PAN_DURATION_S};

// Session context object and lifecycle state machine
pub mod session;
pub use session::{GeolocationProvider, Session, SessionState, WorkoutEdit, WorkoutForm};

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use waylog::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// ============================================================================
// Tests
// ============================================================================
