use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Central error type for the midi-gen-client crate.
#[derive(Debug, Error)]
pub enum MidiGenError {
    // Local preconditions, raised before any network call
    #[error("API token is missing or not a valid header value")]
    MissingToken,

    #[error("MIDI file not found: {}", .0.display())]
    MidiNotFound(PathBuf),

    #[error("File must be a MIDI file (.mid or .midi): {}", .0.display())]
    NotMidi(PathBuf),

    // Remote service
    #[error("{operation} failed: {status} - {body}")]
    Remote {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Generation {job_id} failed: {detail}")]
    JobFailed { job_id: String, detail: String },

    #[error("Generation {job_id} did not complete within {} seconds", .timeout.as_secs())]
    Timeout { job_id: String, timeout: Duration },

    #[error("Response is missing `{0}`")]
    MissingField(&'static str),

    #[error("Config error: {0}")]
    Config(String),

    // Transport and local I/O
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("I/O error: {0}")]
    Io(std::io::Error),

    #[error("JSON error: {0}")]
    Json(serde_json::Error),
}

impl MidiGenError {
    /// True for the local precondition failures that are reported before
    /// anything is sent to the service.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MidiGenError::MissingToken | MidiGenError::MidiNotFound(_) | MidiGenError::NotMidi(_)
        )
    }

    /// HTTP status of a [`MidiGenError::Remote`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            MidiGenError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for MidiGenError {
    fn from(e: std::io::Error) -> Self {
        MidiGenError::Io(e)
    }
}

impl From<serde_json::Error> for MidiGenError {
    fn from(e: serde_json::Error) -> Self {
        MidiGenError::Json(e)
    }
}

impl From<reqwest::Error> for MidiGenError {
    fn from(e: reqwest::Error) -> Self {
        MidiGenError::Http(e)
    }
}

pub type Result<T> = std::result::Result<T, MidiGenError>;
