//! # Persistence
//!
//! Whole-store persistence to a single named durable storage slot.
//!
//! The store is serialized as one JSON blob (a versioned envelope wrapping
//! the ordered record array) and rewritten in full on every save, so a crash
//! between mutate and persist loses at most the most recent record and never
//! corrupts earlier ones.
//!
//! Loading is lenient where the data allows it: a missing or unparsable slot
//! means "no prior state", and individual entries with an unknown kind or
//! invalid numerics are skipped with a warning rather than failing the whole
//! hydration. Write failures are surfaced as [`WaylogError::Persistence`],
//! never swallowed.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaylogError};
use crate::store::WorkoutStore;
use crate::workout::{StoredWorkout, Workout};

/// Name of the durable slot holding the serialized store.
pub const WORKOUTS_SLOT: &str = "workouts";

/// Current version of the persisted envelope.
///
/// Version 0 is the legacy un-versioned form: a bare top-level array.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Storage slot boundary
// ============================================================================

/// A durable string-keyed blob store, the external storage boundary.
///
/// Writes are whole-value overwrites; there is no partial update.
pub trait StorageSlot {
    /// Read the value under `key`, or `None` if the slot is absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` entirely. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

// Lets a session borrow a slot that outlives it (process restart in tests).
impl<S: StorageSlot + ?Sized> StorageSlot for &mut S {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory slot for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed slot: one file per key under a base directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written blob.
#[derive(Debug)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Create a slot rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// Persisted envelope
// ============================================================================

/// Versioned envelope around the ordered record array.
///
/// Records are kept as raw JSON values so one malformed entry can be skipped
/// without failing the rest.
#[derive(Debug, Serialize, Deserialize)]
struct SlotEnvelope {
    version: u32,
    workouts: Vec<serde_json::Value>,
}

// ============================================================================
// Persistence adapter
// ============================================================================

/// Serializes the workout store to a named slot and rebuilds it from there.
#[derive(Debug)]
pub struct PersistenceAdapter<S: StorageSlot> {
    slot: S,
    key: String,
}

impl<S: StorageSlot> PersistenceAdapter<S> {
    /// Create an adapter bound to the default [`WORKOUTS_SLOT`] key.
    pub fn new(slot: S) -> Self {
        Self::with_key(slot, WORKOUTS_SLOT)
    }

    /// Create an adapter bound to a custom slot key.
    pub fn with_key(slot: S, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    /// Serialize every record into the versioned envelope and overwrite the
    /// slot with it as one atomic blob.
    pub fn save(&mut self, store: &WorkoutStore) -> Result<()> {
        let workouts: Vec<serde_json::Value> = store
            .iter()
            .map(|w| serde_json::to_value(w.to_stored()))
            .collect::<std::result::Result<_, _>>()?;

        let envelope = SlotEnvelope {
            version: SCHEMA_VERSION,
            workouts,
        };
        let blob = serde_json::to_string(&envelope)?;
        self.slot.write(&self.key, &blob)?;
        log::debug!(
            "persistence: saved {} workouts to slot '{}'",
            store.len(),
            self.key
        );
        Ok(())
    }

    /// Load the persisted records in their original order.
    ///
    /// An absent or unparsable slot yields an empty sequence ("no prior
    /// state"). Entries with an unrecognized kind or invalid inputs are
    /// skipped with a warning; they must never fail rehydration.
    pub fn load(&self) -> Result<Vec<Workout>> {
        let blob = match self.slot.read(&self.key)? {
            Some(blob) => blob,
            None => {
                log::debug!("persistence: slot '{}' is absent", self.key);
                return Ok(Vec::new());
            }
        };

        let entries = match serde_json::from_str::<serde_json::Value>(&blob) {
            // Legacy version-0 form: bare top-level array
            Ok(serde_json::Value::Array(entries)) => entries,
            Ok(value) => match serde_json::from_value::<SlotEnvelope>(value) {
                Ok(envelope) => {
                    if envelope.version > SCHEMA_VERSION {
                        log::warn!(
                            "persistence: slot '{}' has newer schema version {}, reading anyway",
                            self.key,
                            envelope.version
                        );
                    }
                    envelope.workouts
                }
                Err(err) => {
                    log::warn!(
                        "persistence: slot '{}' has an unrecognized shape ({err}), treating as empty",
                        self.key
                    );
                    return Ok(Vec::new());
                }
            },
            Err(err) => {
                log::warn!(
                    "persistence: slot '{}' is unparsable ({err}), treating as empty",
                    self.key
                );
                return Ok(Vec::new());
            }
        };

        let mut workouts = Vec::with_capacity(entries.len());
        for entry in entries {
            let stored: StoredWorkout = match serde_json::from_value(entry) {
                Ok(stored) => stored,
                Err(err) => {
                    log::warn!("persistence: skipping unreadable workout entry: {err}");
                    continue;
                }
            };
            match Workout::from_stored(stored) {
                Ok(workout) => workouts.push(workout),
                Err(err) => {
                    log::warn!("persistence: skipping invalid workout entry: {err}");
                }
            }
        }
        log::debug!(
            "persistence: loaded {} workouts from slot '{}'",
            workouts.len(),
            self.key
        );
        Ok(workouts)
    }

    /// Remove the persisted slot entirely.
    pub fn reset(&mut self) -> Result<()> {
        log::debug!("persistence: removing slot '{}'", self.key);
        self.slot.remove(&self.key)
    }

    /// The underlying slot (test inspection).
    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut S {
        &mut self.slot
    }
}

// ============================================================================
// Tests
// ============================================================================
