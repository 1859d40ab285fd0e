//! Error taxonomy shared by every store backend and the tracker.
//!
//! Each variant is recovered where the user-facing action started (submit,
//! import, export, load) and shown as a single notice via
//! [`TrackerError::notice`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("failed to persist reports: {0}")]
    PersistenceError(String),

    #[error("invalid import format: {0}")]
    InvalidFormat(String),

    #[error("no reports to export")]
    EmptyStore,

    #[error("failed to encode media '{name}': {reason}")]
    MediaEncodingError { name: String, reason: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown county code: {0}")]
    UnknownCounty(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Human-readable message for the action that failed.
    pub fn notice(&self) -> String {
        match self {
            TrackerError::StorageUnavailable(_) => {
                "Failed to load reports. Please try again later.".to_string()
            }
            TrackerError::PersistenceError(_) => {
                "Failed to save report. Please try again.".to_string()
            }
            TrackerError::InvalidFormat(reason) => {
                format!("Error importing reports: {}", reason)
            }
            TrackerError::EmptyStore => "No reports to export!".to_string(),
            TrackerError::MediaEncodingError { name, .. } => {
                format!("Could not read attachment '{}'. Report not submitted.", name)
            }
            TrackerError::MissingField(field) => format!("Please fill in the {} field.", field),
            TrackerError::UnknownCounty(code) => format!("Unknown county '{}'.", code),
        }
    }
}
