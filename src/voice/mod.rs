//! Voice module
//!
//! Speech capture and playback over platform services:
//! - `capture`: one-shot recognition sessions
//! - `playback`: one-at-a-time synthesis
//! - `selector`: script detection and voice choice
//! - `events`: session-scoped platform event delivery
//! - `console`: terminal stand-ins for the platform services

pub mod capture;
pub mod console;
pub mod events;
pub mod playback;
pub mod selector;

pub use capture::{CaptureOutcome, CaptureSession, SpeechRecognizer};
pub use events::{CaptureEvent, EventSink, PlaybackEvent, SessionId};
pub use playback::{PlaybackOutcome, PlaybackSession, SpeechSynthesizer, Utterance};
pub use selector::{detect_language, plan_voice, select_voice, Voice, VoicePlan};
