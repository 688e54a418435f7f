//! Normalized platform events
//!
//! Platform recognizers and synthesizers never call into the controller.
//! They report through an [`EventSink`] bound to the session that started
//! them, and the owning session discards anything tagged with a session id
//! that is no longer active.

use std::sync::Arc;

use crate::error::CaptureError;

/// Identifies one capture or playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Recognition events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The platform began listening
    Started,
    /// Final transcript of the single utterance
    Result(String),
    /// The platform gave up
    Failed(CaptureError),
    /// The platform closed the session
    Ended,
}

/// Synthesis events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Finished,
    /// Raw platform failure description
    Failed(String),
}

type Emit<E> = dyn Fn(SessionId, E) -> bool + Send + Sync;

/// Session-scoped event channel handed to platform adapters
pub struct EventSink<E> {
    session: SessionId,
    emit: Arc<Emit<E>>,
}

impl<E> EventSink<E> {
    pub fn new<F>(session: SessionId, emit: F) -> Self
    where
        F: Fn(SessionId, E) -> bool + Send + Sync + 'static,
    {
        Self {
            session,
            emit: Arc::new(emit),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver an event; returns false once the receiver is gone
    pub fn emit(&self, event: E) -> bool {
        (self.emit)(self.session, event)
    }
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            emit: Arc::clone(&self.emit),
        }
    }
}

impl<E> std::fmt::Debug for EventSink<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_sink_tags_events_with_session() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let sink = EventSink::new(SessionId::new(7), move |id, event: PlaybackEvent| {
            record.lock().unwrap().push((id, event));
            true
        });

        let copy = sink.clone();
        assert!(sink.emit(PlaybackEvent::Started));
        assert!(copy.emit(PlaybackEvent::Finished));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(id, _)| *id == SessionId::new(7)));
    }

    #[test]
    fn test_session_ids_advance() {
        let id = SessionId::new(1);
        assert_eq!(id.next(), SessionId::new(2));
        assert_eq!(id.next().to_string(), "#2");
    }
}
