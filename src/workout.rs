//! # Workout Model
//!
//! The workout domain model: a tagged union over the supported activity
//! kinds, carrying the raw user inputs (pin location, distance, duration,
//! kind-specific extra) plus a session-unique identity and creation time.
//!
//! Derived values (pace, speed, description) are pure functions of the
//! stored inputs and are recomputed on every access, so an in-session edit
//! of distance or duration can never leave a stale metric behind.
//!
//! [`StoredWorkout`] is the structural persistence form: raw inputs only,
//! derived values rebuilt on rehydration.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaylogError};
use crate::GeoPoint;

// Process-wide sequence for id generation. Uniqueness within a session is
// the contract; the counter keeps same-millisecond creations distinct.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// Identity
// ============================================================================

/// Opaque workout identifier, unique per record within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    /// Wrap an existing identifier (rehydration path).
    pub fn new(id: impl Into<String>) -> Self {
        WorkoutId(id.into())
    }

    /// Generate a fresh identifier from the creation time and a process-wide
    /// monotonic sequence.
    fn generate(created_at: DateTime<Utc>) -> Self {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        WorkoutId(format!("{}-{}", created_at.timestamp_millis(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Kinds and kind-specific details
// ============================================================================

/// Activity kind discriminant. Serialized lowercase (`"running"`,
/// `"cycling"`), matching the persisted wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    /// Lowercase wire discriminant.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "running",
            WorkoutKind::Cycling => "cycling",
        }
    }

    /// Capitalized label used in descriptions and list entries.
    pub fn label(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }

    /// Kind-specific marker/list icon.
    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific workout inputs.
///
/// Adding a third activity kind extends this enum; every consumption site
/// matches exhaustively, so the compiler finds the places to update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetails {
    Running { cadence_spm: f64 },
    Cycling { elevation_gain_m: f64 },
}

impl WorkoutDetails {
    /// The kind this detail block belongs to.
    pub fn kind(&self) -> WorkoutKind {
        match self {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

// ============================================================================
// Workout record
// ============================================================================

/// One user-logged exercise session pinned to a map location.
///
/// Raw inputs are immutable except through the explicit edit setters, which
/// re-validate. Identity and creation time never change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Utc>,
    coords: GeoPoint,
    distance_km: f64,
    duration_min: f64,
    details: WorkoutDetails,
}

impl Workout {
    /// Create a new workout from user inputs.
    ///
    /// Fails with [`WaylogError::Validation`] if the pin location is out of
    /// range, if `distance_km` or `duration_min` is not a positive finite
    /// number, if a running cadence is not positive, or if a cycling
    /// elevation gain is negative.
    pub fn new(
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        details: WorkoutDetails,
    ) -> Result<Self> {
        let created_at = Utc::now();
        let id = WorkoutId::generate(created_at);
        Self::from_parts(id, created_at, coords, distance_km, duration_min, details)
    }

    /// Convenience constructor for a running workout.
    pub fn running(
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    ) -> Result<Self> {
        Self::new(
            coords,
            distance_km,
            duration_min,
            WorkoutDetails::Running { cadence_spm },
        )
    }

    /// Convenience constructor for a cycling workout.
    pub fn cycling(
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self> {
        Self::new(
            coords,
            distance_km,
            duration_min,
            WorkoutDetails::Cycling { elevation_gain_m },
        )
    }

    /// Assemble a record with explicit identity and creation time.
    ///
    /// Validation runs here so a freshly created workout and one rebuilt
    /// from storage satisfy exactly the same invariants.
    fn from_parts(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        details: WorkoutDetails,
    ) -> Result<Self> {
        if !coords.is_valid() {
            return Err(WaylogError::validation(format!(
                "coordinates ({}, {}) are out of range",
                coords.latitude, coords.longitude
            )));
        }
        validate_positive("distance", distance_km)?;
        validate_positive("duration", duration_min)?;
        match details {
            WorkoutDetails::Running { cadence_spm } => {
                validate_positive("cadence", cadence_spm)?;
            }
            WorkoutDetails::Cycling { elevation_gain_m } => {
                validate_non_negative("elevation gain", elevation_gain_m)?;
            }
        }

        Ok(Self {
            id,
            created_at,
            coords,
            distance_km,
            duration_min,
            details,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn coords(&self) -> GeoPoint {
        self.coords
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn details(&self) -> &WorkoutDetails {
        &self.details
    }

    pub fn kind(&self) -> WorkoutKind {
        self.details.kind()
    }

    // ========================================================================
    // Derived metrics (pure, recomputed on access)
    // ========================================================================

    /// Running pace in min/km. `None` for other kinds.
    pub fn pace_min_per_km(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Running { .. } => Some(self.duration_min / self.distance_km),
            WorkoutDetails::Cycling { .. } => None,
        }
    }

    /// Cycling speed in km/h. `None` for other kinds.
    pub fn speed_km_per_h(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Cycling { .. } => Some(self.distance_km / (self.duration_min / 60.0)),
            WorkoutDetails::Running { .. } => None,
        }
    }

    /// Display label, e.g. `"Running on August 30"`.
    pub fn description(&self) -> String {
        format!(
            "{} on {} {}",
            self.kind().label(),
            self.created_at.format("%B"),
            self.created_at.day()
        )
    }

    /// Marker popup label: kind icon plus description.
    pub fn popup_label(&self) -> String {
        format!("{} {}", self.kind().icon(), self.description())
    }

    /// Value/unit detail lines for the workout list entry, in display order.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{} km", self.distance_km),
            format!("{} min", self.duration_min),
        ];
        match self.details {
            WorkoutDetails::Running { cadence_spm } => {
                // pace is always Some for running
                if let Some(pace) = self.pace_min_per_km() {
                    lines.push(format!("{pace:.1} min/km"));
                }
                lines.push(format!("{cadence_spm} spm"));
            }
            WorkoutDetails::Cycling { elevation_gain_m } => {
                if let Some(speed) = self.speed_km_per_h() {
                    lines.push(format!("{speed:.1} km/h"));
                }
                lines.push(format!("{elevation_gain_m} m"));
            }
        }
        lines
    }

    // ========================================================================
    // Edit flow
    // ========================================================================

    /// Update the distance; re-validated. Derived metrics pick up the new
    /// value on the next access.
    pub fn set_distance_km(&mut self, distance_km: f64) -> Result<()> {
        validate_positive("distance", distance_km)?;
        self.distance_km = distance_km;
        Ok(())
    }

    /// Update the duration; re-validated.
    pub fn set_duration_min(&mut self, duration_min: f64) -> Result<()> {
        validate_positive("duration", duration_min)?;
        self.duration_min = duration_min;
        Ok(())
    }

    /// Update the running cadence. Fails with a validation error on a
    /// cycling workout.
    pub fn set_cadence_spm(&mut self, cadence_spm: f64) -> Result<()> {
        validate_positive("cadence", cadence_spm)?;
        match &mut self.details {
            WorkoutDetails::Running {
                cadence_spm: value,
            } => {
                *value = cadence_spm;
                Ok(())
            }
            WorkoutDetails::Cycling { .. } => Err(WaylogError::validation(
                "cadence applies only to running workouts",
            )),
        }
    }

    /// Update the cycling elevation gain. Fails with a validation error on a
    /// running workout.
    pub fn set_elevation_gain_m(&mut self, elevation_gain_m: f64) -> Result<()> {
        validate_non_negative("elevation gain", elevation_gain_m)?;
        match &mut self.details {
            WorkoutDetails::Cycling {
                elevation_gain_m: value,
            } => {
                *value = elevation_gain_m;
                Ok(())
            }
            WorkoutDetails::Running { .. } => Err(WaylogError::validation(
                "elevation gain applies only to cycling workouts",
            )),
        }
    }

    // ========================================================================
    // Plain-data round-trip
    // ========================================================================

    /// Project the record onto its structural persistence form. Derived
    /// values are never persisted.
    pub fn to_stored(&self) -> StoredWorkout {
        let (cadence, elevation_gain) = match self.details {
            WorkoutDetails::Running { cadence_spm } => (Some(cadence_spm), None),
            WorkoutDetails::Cycling { elevation_gain_m } => (None, Some(elevation_gain_m)),
        };
        StoredWorkout {
            id: self.id.as_str().to_string(),
            created_at: self.created_at,
            coords: [self.coords.latitude, self.coords.longitude],
            distance: self.distance_km,
            duration: self.duration_min,
            kind: self.kind(),
            cadence,
            elevation_gain,
        }
    }

    /// Rebuild a record from its structural persistence form, re-deriving
    /// pace/speed/description from the persisted raw inputs.
    ///
    /// Inputs are re-validated: a hand-edited slot cannot smuggle in values
    /// that `new` would have rejected.
    pub fn from_stored(stored: StoredWorkout) -> Result<Self> {
        let details = match stored.kind {
            WorkoutKind::Running => WorkoutDetails::Running {
                cadence_spm: stored.cadence.ok_or_else(|| {
                    WaylogError::validation("running workout without a cadence field")
                })?,
            },
            WorkoutKind::Cycling => WorkoutDetails::Cycling {
                elevation_gain_m: stored.elevation_gain.ok_or_else(|| {
                    WaylogError::validation("cycling workout without an elevationGain field")
                })?,
            },
        };

        Self::from_parts(
            WorkoutId::new(stored.id),
            stored.created_at,
            GeoPoint::new(stored.coords[0], stored.coords[1]),
            stored.distance,
            stored.duration,
            details,
        )
    }
}

impl fmt::Display for Workout {
    /// One-line list entry, e.g. `"Running on August 30 (5 km, 25 min)"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} km, {} min)",
            self.description(),
            self.distance_km,
            self.duration_min
        )
    }
}

/// Structural persistence form of a workout: raw inputs and identity only.
///
/// Field names match the persisted wire format (`createdAt`, `coords` as a
/// `[lat, lng]` pair, `type` as the lowercase kind discriminant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkout {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub coords: [f64; 2],
    pub distance: f64,
    pub duration: f64,
    #[serde(rename = "type")]
    pub kind: WorkoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
}

// ============================================================================
// Validation helpers
// ============================================================================

fn validate_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(WaylogError::validation(format!(
            "{field} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(WaylogError::validation(format!(
            "{field} must be a non-negative finite number, got {value}"
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn london() -> GeoPoint {
        GeoPoint::new(51.5074, -0.1278)
    }

    fn stored_running(created_at: DateTime<Utc>) -> StoredWorkout {
        StoredWorkout {
            id: "1700000000000-0".to_string(),
            created_at,
            coords: [51.5, -0.12],
            distance: 5.0,
            duration: 25.0,
            kind: WorkoutKind::Running,
            cadence: Some(178.0),
            elevation_gain: None,
        }
    }

    #[test]
    fn test_running_pace_is_exact() {
        let run = Workout::running(london(), 5.0, 25.0, 178.0).unwrap();
        assert_eq!(run.pace_min_per_km(), Some(5.0));
        assert_eq!(run.speed_km_per_h(), None);
        assert_eq!(run.kind(), WorkoutKind::Running);
    }

    #[test]
    fn test_cycling_speed_is_exact() {
        let ride = Workout::cycling(london(), 20.0, 60.0, 350.0).unwrap();
        assert_eq!(ride.speed_km_per_h(), Some(20.0));
        assert_eq!(ride.pace_min_per_km(), None);
    }

    #[test]
    fn test_zero_elevation_gain_is_allowed() {
        assert!(Workout::cycling(london(), 10.0, 30.0, 0.0).is_ok());
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        // distance/duration must be positive and finite
        assert!(Workout::running(london(), 0.0, 25.0, 178.0).is_err());
        assert!(Workout::running(london(), -5.0, 25.0, 178.0).is_err());
        assert!(Workout::running(london(), 5.0, 0.0, 178.0).is_err());
        assert!(Workout::running(london(), f64::NAN, 25.0, 178.0).is_err());
        assert!(Workout::running(london(), 5.0, f64::INFINITY, 178.0).is_err());
        // running cadence must be positive
        assert!(Workout::running(london(), 5.0, 25.0, 0.0).is_err());
        assert!(Workout::running(london(), 5.0, 25.0, f64::NAN).is_err());
        // cycling elevation gain must be non-negative
        assert!(Workout::cycling(london(), 20.0, 60.0, -1.0).is_err());
        // pin location must be in range
        assert!(Workout::running(GeoPoint::new(91.0, 0.0), 5.0, 25.0, 178.0).is_err());
    }

    #[test]
    fn test_rejections_are_validation_errors() {
        let err = Workout::running(london(), -1.0, 25.0, 178.0).unwrap_err();
        assert!(matches!(err, WaylogError::Validation(_)));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Workout::running(london(), 5.0, 25.0, 178.0).unwrap();
        let b = Workout::running(london(), 5.0, 25.0, 178.0).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_description_uses_creation_month_and_day() {
        let created = Utc.with_ymd_and_hms(2024, 8, 9, 12, 0, 0).unwrap();
        let run = Workout::from_stored(stored_running(created)).unwrap();
        assert_eq!(run.description(), "Running on August 9");
        assert_eq!(run.popup_label(), "🏃‍♂️ Running on August 9");
    }

    #[test]
    fn test_stored_round_trip_preserves_everything() {
        let run = Workout::running(london(), 5.2, 24.0, 180.0).unwrap();
        let rebuilt = Workout::from_stored(run.to_stored()).unwrap();
        assert_eq!(rebuilt.id(), run.id());
        assert_eq!(rebuilt.created_at(), run.created_at());
        assert_eq!(rebuilt.coords(), run.coords());
        assert_eq!(rebuilt.distance_km(), run.distance_km());
        assert_eq!(rebuilt.duration_min(), run.duration_min());
        assert_eq!(rebuilt.kind(), run.kind());
        assert_eq!(rebuilt.pace_min_per_km(), run.pace_min_per_km());
        assert_eq!(rebuilt.description(), run.description());
    }

    #[test]
    fn test_stored_wire_format() {
        let created = Utc.with_ymd_and_hms(2024, 8, 9, 12, 0, 0).unwrap();
        let run = Workout::from_stored(stored_running(created)).unwrap();
        let json = serde_json::to_value(run.to_stored()).unwrap();
        assert_eq!(json["type"], "running");
        assert_eq!(json["coords"][0], 51.5);
        assert_eq!(json["cadence"], 178.0);
        // cycling-only field absent, not null
        assert!(json.get("elevationGain").is_none());
    }

    #[test]
    fn test_from_stored_requires_kind_specific_field() {
        let created = Utc.with_ymd_and_hms(2024, 8, 9, 12, 0, 0).unwrap();
        let mut stored = stored_running(created);
        stored.cadence = None;
        assert!(Workout::from_stored(stored).is_err());
    }

    #[test]
    fn test_from_stored_revalidates_inputs() {
        let created = Utc.with_ymd_and_hms(2024, 8, 9, 12, 0, 0).unwrap();
        let mut stored = stored_running(created);
        stored.distance = -3.0;
        assert!(Workout::from_stored(stored).is_err());
    }

    #[test]
    fn test_edits_refresh_derived_metrics() {
        let mut run = Workout::running(london(), 5.0, 25.0, 178.0).unwrap();
        run.set_duration_min(30.0).unwrap();
        assert_eq!(run.pace_min_per_km(), Some(6.0));
        assert!(run.set_distance_km(0.0).is_err());
        // failed edit leaves the record untouched
        assert_eq!(run.distance_km(), 5.0);
    }

    #[test]
    fn test_kind_mismatched_edit_is_rejected() {
        let mut ride = Workout::cycling(london(), 20.0, 60.0, 350.0).unwrap();
        assert!(ride.set_cadence_spm(170.0).is_err());
        assert!(ride.set_elevation_gain_m(400.0).is_ok());
    }

    #[test]
    fn test_summary_lines() {
        let run = Workout::running(london(), 5.0, 25.0, 178.0).unwrap();
        let lines = run.summary_lines();
        assert_eq!(lines[0], "5 km");
        assert_eq!(lines[1], "25 min");
        assert_eq!(lines[2], "5.0 min/km");
        assert_eq!(lines[3], "178 spm");

        let ride = Workout::cycling(london(), 20.0, 60.0, 350.0).unwrap();
        assert_eq!(ride.summary_lines()[2], "20.0 km/h");
        assert_eq!(ride.summary_lines()[3], "350 m");
    }
}
