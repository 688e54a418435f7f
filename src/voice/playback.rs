//! Speech playback session
//!
//! Wraps the platform speech synthesizer. Synthesis is a single shared
//! resource, so starting an utterance always cancels the one in progress.
//!
//! # Defaults
//!
//! - Rate 0.9 (slightly slower than natural for clarity)
//! - Pitch and volume at the platform default of 1.0

use tracing::{debug, info, warn};

use crate::error::PlaybackError;
use crate::voice::events::{EventSink, PlaybackEvent, SessionId};
use crate::voice::selector::Voice;

/// Default speaking rate
pub const DEFAULT_SPEECH_RATE: f32 = 0.9;

/// One request to the synthesizer
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub locale: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: Option<Voice>, locale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice,
            locale: locale.into(),
            rate: DEFAULT_SPEECH_RATE,
            pitch: 1.0,
            volume: 1.0,
        }
    }

    /// Set speaking rate
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate.clamp(0.1, 10.0);
        self
    }
}

/// Platform speech synthesis service
pub trait SpeechSynthesizer: Send {
    /// Voices currently offered; may grow after startup
    fn voices(&self) -> Vec<Voice>;

    /// Begin speaking; progress is reported through `events`
    fn speak(&mut self, utterance: Utterance, events: EventSink<PlaybackEvent>) -> Result<(), String>;

    /// Stop whatever is being spoken; safe when idle
    fn cancel(&mut self);
}

/// How an utterance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Failed(PlaybackError),
}

/// One-at-a-time wrapper around the platform synthesizer
pub struct PlaybackSession {
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    rate: f32,
    active: Option<SessionId>,
    last_session: SessionId,
}

impl PlaybackSession {
    /// `None` means the platform has no synthesis capability
    pub fn new(synthesizer: Option<Box<dyn SpeechSynthesizer>>, rate: f32) -> Self {
        Self {
            synthesizer,
            rate,
            active: None,
            last_session: SessionId::new(0),
        }
    }

    pub fn unsupported() -> Self {
        Self::new(None, DEFAULT_SPEECH_RATE)
    }

    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    /// Voice catalog from the platform, empty when unsupported
    pub fn voices(&self) -> Vec<Voice> {
        self.synthesizer
            .as_ref()
            .map(|s| s.voices())
            .unwrap_or_default()
    }

    /// Speak `text`, cancelling any current utterance first
    ///
    /// Marks the session as speaking before returning.
    pub fn speak<F>(
        &mut self,
        text: &str,
        voice: Option<Voice>,
        locale: &str,
        make_sink: F,
    ) -> Result<SessionId, PlaybackError>
    where
        F: FnOnce(SessionId) -> EventSink<PlaybackEvent>,
    {
        if self.synthesizer.is_none() {
            warn!("Text-to-speech is not supported on this platform");
            return Err(PlaybackError::Unsupported);
        }

        self.stop();

        let session = self.last_session.next();
        self.last_session = session;

        let utterance = Utterance::new(text, voice, locale).with_rate(self.rate);
        debug!(
            "Speaking ({}) in {} with voice {:?}",
            session,
            utterance.locale,
            utterance.voice.as_ref().map(|v| v.name.as_str())
        );

        let synthesizer = self
            .synthesizer
            .as_mut()
            .ok_or(PlaybackError::Unsupported)?;
        synthesizer
            .speak(utterance, make_sink(session))
            .map_err(|e| {
                warn!("Speech synthesis failed to start: {}", e);
                PlaybackError::PlatformFailure(e)
            })?;

        self.active = Some(session);
        Ok(session)
    }

    /// Apply a platform event; stale sessions are ignored
    pub fn handle(&mut self, session: SessionId, event: PlaybackEvent) -> Option<PlaybackOutcome> {
        if self.active != Some(session) {
            debug!("Dropping stale playback event {:?} for {}", event, session);
            return None;
        }

        match event {
            PlaybackEvent::Started => {
                debug!("Synthesizer started ({})", session);
                None
            }
            PlaybackEvent::Finished => {
                info!("Finished speaking ({})", session);
                self.active = None;
                Some(PlaybackOutcome::Finished)
            }
            PlaybackEvent::Failed(reason) => {
                warn!("Speech synthesis error ({}): {}", session, reason);
                self.active = None;
                Some(PlaybackOutcome::Failed(PlaybackError::PlatformFailure(reason)))
            }
        }
    }

    /// Cancel the current utterance; no-op when idle
    pub fn stop(&mut self) {
        if let Some(session) = self.active.take() {
            if let Some(synthesizer) = self.synthesizer.as_mut() {
                synthesizer.cancel();
            }
            debug!("Cancelled speech ({})", session);
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}
