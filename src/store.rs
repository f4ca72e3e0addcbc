//! # Workout Store
//!
//! Ordered in-memory collection of workout records; the source of truth for
//! a session. Insertion order is display order (newest last). Records enter
//! only through [`WorkoutStore::add`] and are never removed individually;
//! the only bulk destructive operation is [`WorkoutStore::clear`], driven by
//! the session's reset flow.

use crate::error::{Result, WaylogError};
use crate::workout::{Workout, WorkoutId};

/// Ordered in-memory workout collection.
#[derive(Debug, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a workout. O(1) amortized.
    ///
    /// Ids are unique by construction; the store does not enforce it.
    pub fn add(&mut self, workout: Workout) {
        log::debug!("store: adding workout {}", workout.id());
        self.workouts.push(workout);
    }

    /// Find a workout by id. Linear scan, first match.
    pub fn find_by_id(&self, id: &WorkoutId) -> Result<&Workout> {
        self.workouts
            .iter()
            .find(|w| w.id() == id)
            .ok_or_else(|| WaylogError::NotFound(id.to_string()))
    }

    /// Mutable lookup for the edit flow.
    pub fn find_by_id_mut(&mut self, id: &WorkoutId) -> Result<&mut Workout> {
        self.workouts
            .iter_mut()
            .find(|w| w.id() == id)
            .ok_or_else(|| WaylogError::NotFound(id.to_string()))
    }

    /// Iterate over all workouts in insertion order. Restartable; no
    /// snapshot semantics (single-threaded model).
    pub fn iter(&self) -> impl Iterator<Item = &Workout> {
        self.workouts.iter()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Drop every record. In-memory only; the persisted slot is cleared
    /// separately by the session's reset flow.
    pub fn clear(&mut self) {
        log::debug!("store: clearing {} workouts", self.workouts.len());
        self.workouts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoPoint;

    fn run(distance_km: f64) -> Workout {
        Workout::running(GeoPoint::new(51.5, -0.12), distance_km, 25.0, 178.0).unwrap()
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut store = WorkoutStore::new();
        store.add(run(1.0));
        store.add(run(2.0));
        store.add(run(3.0));

        let distances: Vec<f64> = store.iter().map(|w| w.distance_km()).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_find_by_id() {
        let mut store = WorkoutStore::new();
        let workout = run(5.0);
        let id = workout.id().clone();
        store.add(workout);

        assert_eq!(store.find_by_id(&id).unwrap().id(), &id);

        let missing = WorkoutId::new("does-not-exist");
        assert!(matches!(
            store.find_by_id(&missing),
            Err(WaylogError::NotFound(_))
        ));
    }

    #[test]
    fn test_clear_empties_the_store() {
        let mut store = WorkoutStore::new();
        store.add(run(5.0));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut store = WorkoutStore::new();
        store.add(run(5.0));
        assert_eq!(store.iter().count(), 1);
        assert_eq!(store.iter().count(), 1);
    }
}
