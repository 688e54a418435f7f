//! Speech capture session
//!
//! Wraps a platform speech recognizer in single-utterance mode. The session
//! owns the recognizer; at most one recognition attempt is active at a time.
//!
//! ```text
//! idle ──start──▶ listening ──Result──▶ completed(text) ─┐
//!                     │ ──Failed──▶ failed(kind) ────────┼──▶ idle
//!                     └─stop/abort/Ended──▶ aborted ─────┘
//! ```

use tracing::{debug, info, warn};

use crate::error::{CaptureError, CaptureStartError};
use crate::voice::events::{CaptureEvent, EventSink, SessionId};

/// Platform speech recognition service
///
/// Implementations report back only through the sink given to `start`.
/// `stop` and `abort` must be safe to call when nothing is running.
pub trait SpeechRecognizer: Send {
    /// Begin recognizing a single utterance in `locale`
    fn start(&mut self, locale: &str, events: EventSink<CaptureEvent>) -> Result<(), String>;

    /// Ask the platform to finish the current attempt
    fn stop(&mut self);

    /// Cancel the current attempt without a result
    fn abort(&mut self);
}

/// How a listening session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Completed(String),
    Failed(CaptureError),
    /// Platform closed the session without a result
    Ended,
}

/// Lifecycle of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Idle,
    Listening { session: SessionId },
}

/// One-at-a-time wrapper around the platform recognizer
pub struct CaptureSession {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    state: CaptureState,
    last_session: SessionId,
    transcript: Option<String>,
    last_error: Option<CaptureError>,
}

impl CaptureSession {
    /// `None` means the platform has no recognition capability
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            state: CaptureState::Idle,
            last_session: SessionId::new(0),
            transcript: None,
            last_error: None,
        }
    }

    pub fn unsupported() -> Self {
        Self::new(None)
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, CaptureState::Listening { .. })
    }

    /// Session currently listening, if any
    pub fn active_session(&self) -> Option<SessionId> {
        match self.state {
            CaptureState::Listening { session } => Some(session),
            CaptureState::Idle => None,
        }
    }

    /// Transcript of the last completed session
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Error reported by the last failed session
    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    /// Start listening in `locale`
    ///
    /// `make_sink` builds the event sink for the new session id. Callers must
    /// stop an active session first; this is not recovered here.
    pub fn start<F>(&mut self, locale: &str, make_sink: F) -> Result<SessionId, CaptureStartError>
    where
        F: FnOnce(SessionId) -> EventSink<CaptureEvent>,
    {
        if self.is_listening() {
            return Err(CaptureStartError::AlreadyActive);
        }
        let recognizer = self
            .recognizer
            .as_mut()
            .ok_or(CaptureStartError::NotSupported)?;

        self.transcript = None;
        self.last_error = None;

        let session = self.last_session.next();
        self.last_session = session;

        recognizer
            .start(locale, make_sink(session))
            .map_err(|e| {
                warn!("Speech recognition failed to start: {}", e);
                CaptureStartError::StartFailed(e)
            })?;

        info!("Listening ({}) in {}", session, locale);
        self.state = CaptureState::Listening { session };
        Ok(session)
    }

    /// Apply a platform event
    ///
    /// Events for sessions that are no longer listening are dropped. The
    /// first result completes the session; anything after it is stale.
    pub fn handle(&mut self, session: SessionId, event: CaptureEvent) -> Option<CaptureOutcome> {
        if self.active_session() != Some(session) {
            debug!("Dropping stale capture event {:?} for {}", event, session);
            return None;
        }

        match event {
            CaptureEvent::Started => {
                debug!("Recognizer started ({})", session);
                None
            }
            CaptureEvent::Result(text) => {
                let text = text.trim().to_string();
                info!("Recognized ({}): {:?}", session, text);
                self.state = CaptureState::Idle;
                self.transcript = Some(text.clone());
                Some(CaptureOutcome::Completed(text))
            }
            CaptureEvent::Failed(error) => {
                warn!("Speech recognition error ({}): {}", session, error);
                self.state = CaptureState::Idle;
                self.last_error = Some(error.clone());
                Some(CaptureOutcome::Failed(error))
            }
            CaptureEvent::Ended => {
                debug!("Recognizer ended without a result ({})", session);
                self.state = CaptureState::Idle;
                Some(CaptureOutcome::Ended)
            }
        }
    }

    /// Finish the active session; no-op when idle
    ///
    /// The session is idle when this returns and any late platform events
    /// for it, including a final result, are discarded.
    pub fn stop(&mut self) {
        if let CaptureState::Listening { session } = self.state {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.stop();
            }
            debug!("Stopped listening ({})", session);
            self.state = CaptureState::Idle;
        }
    }

    /// Cancel the active session; no-op when idle
    pub fn abort(&mut self) {
        if let CaptureState::Listening { session } = self.state {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort();
            }
            debug!("Aborted listening ({})", session);
            self.state = CaptureState::Idle;
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.abort();
    }
}
