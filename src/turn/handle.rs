//! Presentation boundary
//!
//! The rendering layer sees the controller only through a cloneable
//! [`ControllerHandle`]: commands go in as events, state comes out as
//! [`ControllerSnapshot`]s on a watch channel.

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::error::LanguageError;
use crate::language::Language;
use crate::turn::controller::{ConnectionStatus, ControllerEvent, TurnState};
use crate::types::Message;

/// Everything the rendering layer needs to draw the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub messages: Vec<Message>,
    pub state: TurnState,
    pub is_listening: bool,
    pub is_speaking: bool,
    pub is_processing: bool,
    pub connection: ConnectionStatus,
    /// Transient error text, if one is showing
    pub error: Option<String>,
    pub capture_supported: bool,
    pub playback_supported: bool,
    pub language: Language,
}

/// Errors returned by handle commands
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error(transparent)]
    Language(#[from] LanguageError),

    #[error("Turn controller has shut down")]
    Closed,
}

/// Cloneable command/observation handle for a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    events: mpsc::UnboundedSender<ControllerEvent>,
    snapshots: watch::Receiver<ControllerSnapshot>,
}

impl ControllerHandle {
    pub(crate) fn new(
        events: mpsc::UnboundedSender<ControllerEvent>,
        snapshots: watch::Receiver<ControllerSnapshot>,
    ) -> Self {
        Self { events, snapshots }
    }

    fn send(&self, event: ControllerEvent) -> Result<(), HandleError> {
        self.events.send(event).map_err(|_| HandleError::Closed)
    }

    /// Submit typed text as a new turn
    pub fn submit(&self, text: impl Into<String>) -> Result<(), HandleError> {
        self.send(ControllerEvent::Submit(text.into()))
    }

    /// Start listening, or stop if already listening
    pub fn toggle_capture(&self) -> Result<(), HandleError> {
        self.send(ControllerEvent::ToggleCapture)
    }

    /// Switch conversation language by tag
    pub fn set_language(&self, tag: &str) -> Result<(), HandleError> {
        let language: Language = tag.parse()?;
        self.send(ControllerEvent::SetLanguage(language))
    }

    /// Re-check responder connectivity
    pub fn probe(&self) -> Result<(), HandleError> {
        self.send(ControllerEvent::Probe)
    }

    pub fn shutdown(&self) -> Result<(), HandleError> {
        self.send(ControllerEvent::Shutdown)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshots.clone()
    }
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("closed", &self.events.is_closed())
            .finish()
    }
}
