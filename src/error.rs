//! Unified error handling for the waylog library.
//!
//! This module provides a consistent error type for all tracker operations,
//! replacing the original mixed handling (silent drops, blocking alerts).

/// Unified error type for workout tracker operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaylogError {
    /// Numeric input failed the sanity checks (non-finite, non-positive,
    /// or a missing kind-specific field).
    #[error("invalid workout input: {0}")]
    Validation(String),

    /// Lookup of an unknown workout id. Should not reach the user in normal
    /// operation; indicates a UI/state desync.
    #[error("no workout with id '{0}'")]
    NotFound(String),

    /// Durable storage read/write failure. Surfaced to the caller rather
    /// than swallowed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The user declined the position request, or the platform has no
    /// geolocation capability. The session continues without map centering.
    #[error("could not get the current position")]
    GeolocationDenied,

    /// Session method called in the wrong lifecycle state (hydrating twice,
    /// submitting before hydration, submitting without a map click).
    #[error("session lifecycle error: {0}")]
    Lifecycle(String),
}

impl WaylogError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        WaylogError::Validation(message.into())
    }

    /// Build a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        WaylogError::Persistence(message.into())
    }

    /// The fixed modal text a UI layer shows for user-facing failures.
    ///
    /// Returns `None` for internal errors that should not be surfaced as
    /// alerts (`NotFound`, `Persistence`, `Lifecycle`).
    pub fn user_alert(&self) -> Option<&'static str> {
        match self {
            WaylogError::Validation(_) => Some("Inputs have to be positive numbers!"),
            WaylogError::GeolocationDenied => Some("Could not get your position"),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WaylogError {
    fn from(err: std::io::Error) -> Self {
        WaylogError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for WaylogError {
    fn from(err: serde_json::Error) -> Self {
        WaylogError::Persistence(err.to_string())
    }
}

/// Result type alias for waylog operations.
pub type Result<T> = std::result::Result<T, WaylogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WaylogError::Validation("distance must be positive".to_string());
        assert!(err.to_string().contains("distance"));
        assert_eq!(err.user_alert(), Some("Inputs have to be positive numbers!"));
    }

    #[test]
    fn test_internal_errors_have_no_alert() {
        assert!(WaylogError::NotFound("123".to_string()).user_alert().is_none());
        assert!(WaylogError::persistence("disk full").user_alert().is_none());
    }

    #[test]
    fn test_io_error_maps_to_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded");
        let err: WaylogError = io.into();
        assert!(matches!(err, WaylogError::Persistence(_)));
    }
}
