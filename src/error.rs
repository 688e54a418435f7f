//! Error types for the voice companion
//!
//! Each concern gets its own enum so the turn controller can recover from
//! them at the right boundary: capture and playback errors are handled
//! locally, remote errors at the turn boundary.

use thiserror::Error;

/// Language registry lookup failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

/// Reasons a capture session could not be started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureStartError {
    #[error("Speech recognition is not supported on this platform.")]
    NotSupported,

    #[error("A speech recognition session is already active")]
    AlreadyActive,

    #[error("Failed to start speech recognition: {0}")]
    StartFailed(String),
}

impl CaptureStartError {
    /// Fixed message shown to the user; platform detail stays in the log
    pub fn user_message(&self) -> String {
        match self {
            CaptureStartError::StartFailed(_) => "Failed to start speech recognition".to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors reported by the platform while a capture session is listening
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no-speech")]
    NoSpeech,

    #[error("audio-capture")]
    AudioCapture,

    #[error("not-allowed")]
    NotAllowed,

    #[error("network")]
    Network,

    #[error("{0}")]
    Other(String),
}

impl CaptureError {
    /// Map a raw platform error code onto the taxonomy
    pub fn from_platform_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => CaptureError::NoSpeech,
            "audio-capture" => CaptureError::AudioCapture,
            "not-allowed" => CaptureError::NotAllowed,
            "network" => CaptureError::Network,
            other => CaptureError::Other(other.to_string()),
        }
    }

    /// Fixed message shown to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::NoSpeech => "No speech detected. Please try again.".to_string(),
            CaptureError::AudioCapture => "Microphone not found or not working.".to_string(),
            CaptureError::NotAllowed => {
                "Microphone permission denied. Please allow microphone access.".to_string()
            }
            CaptureError::Network => "Network error. Please check your connection.".to_string(),
            CaptureError::Other(code) => format!("Error: {}", code),
        }
    }
}

/// Speech playback failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Text-to-speech is not supported on this platform")]
    Unsupported,

    #[error("Speech synthesis failed: {0}")]
    PlatformFailure(String),
}

/// Remote responder failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Responder unreachable: {0}")]
    Unreachable(String),

    #[error("Responder returned HTTP {0}")]
    BadStatus(u16),

    #[error("Responder returned an invalid body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            RemoteError::BadStatus(status.as_u16())
        } else if err.is_decode() {
            RemoteError::InvalidBody(err.to_string())
        } else {
            RemoteError::Unreachable(err.to_string())
        }
    }
}
