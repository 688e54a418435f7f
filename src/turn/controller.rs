//! Turn controller actor

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::conversation::ConversationLog;
use crate::agent::responder::Responder;
use crate::config::Config;
use crate::error::{CaptureStartError, PlaybackError, RemoteError};
use crate::language::Language;
use crate::turn::handle::{ControllerHandle, ControllerSnapshot};
use crate::turn::transient::{TransientError, DEFAULT_ERROR_WINDOW};
use crate::types::Message;
use crate::voice::capture::{CaptureOutcome, CaptureSession, SpeechRecognizer};
use crate::voice::events::{CaptureEvent, EventSink, PlaybackEvent, SessionId};
use crate::voice::playback::{PlaybackOutcome, PlaybackSession, SpeechSynthesizer, DEFAULT_SPEECH_RATE};
use crate::voice::selector::plan_voice;

/// Assistant message appended when the responder cannot be reached
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting to my brain.";

/// Transient error shown when a reply could not be fetched
pub const REMOTE_ERROR_MESSAGE: &str = "Failed to get a response. Please check your connection.";

/// Transient error shown when the platform fails to speak a reply
pub const PLAYBACK_ERROR_MESSAGE: &str = "Speech playback failed.";

/// Where the current turn is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    Idle,
    Listening,
    Processing,
    Speaking,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TurnState::Idle => "idle",
            TurnState::Listening => "listening",
            TurnState::Processing => "processing",
            TurnState::Speaking => "speaking",
        };
        f.write_str(label)
    }
}

/// Responder reachability as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Checking,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionStatus::Checking => "checking",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Everything the controller reacts to
#[derive(Debug)]
pub enum ControllerEvent {
    Submit(String),
    ToggleCapture,
    SetLanguage(Language),
    Probe,
    Capture {
        session: SessionId,
        event: CaptureEvent,
    },
    Playback {
        session: SessionId,
        event: PlaybackEvent,
    },
    ReplyReceived {
        turn: u64,
        result: Result<String, RemoteError>,
    },
    ProbeCompleted(Result<(), RemoteError>),
    Shutdown,
}

/// Result of a submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    /// Blank after trimming
    Empty,
    /// A reply is already outstanding
    Busy,
}

/// Controller settings
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub language: Language,
    pub greeting: String,
    pub speech_rate: f32,
    pub detect_reply_language: bool,
    pub error_display: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            greeting: String::new(),
            speech_rate: DEFAULT_SPEECH_RATE,
            detect_reply_language: true,
            error_display: DEFAULT_ERROR_WINDOW,
        }
    }
}

impl ControllerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.voice.language,
            greeting: config.conversation.greeting.clone(),
            speech_rate: config.voice.speech_rate,
            detect_reply_language: config.voice.detect_reply_language,
            error_display: config.ui.error_display(),
        }
    }
}

/// Single-owner state machine for conversation turns
pub struct TurnController {
    config: ControllerConfig,
    state: TurnState,
    connection: ConnectionStatus,
    language: Language,
    log: ConversationLog,
    capture: CaptureSession,
    playback: PlaybackSession,
    responder: Arc<dyn Responder>,
    transient: Option<TransientError>,
    turn: u64,
    shut_down: bool,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    snapshot_tx: watch::Sender<ControllerSnapshot>,
}

impl TurnController {
    /// `None` for recognizer or synthesizer means the platform lacks it
    pub fn new(
        config: ControllerConfig,
        responder: Arc<dyn Responder>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
        synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let capture = CaptureSession::new(recognizer);
        let playback = PlaybackSession::new(synthesizer, config.speech_rate);
        let log = ConversationLog::with_greeting(&config.greeting);

        let initial = ControllerSnapshot {
            messages: log.messages().to_vec(),
            state: TurnState::Idle,
            is_listening: false,
            is_speaking: false,
            is_processing: false,
            connection: ConnectionStatus::Checking,
            error: None,
            capture_supported: capture.is_supported(),
            playback_supported: playback.is_supported(),
            language: config.language,
        };
        let (snapshot_tx, _) = watch::channel(initial);

        if !capture.is_supported() {
            warn!("{}", CaptureStartError::NotSupported);
        }

        Self {
            language: config.language,
            config,
            state: TurnState::Idle,
            connection: ConnectionStatus::Checking,
            log,
            capture,
            playback,
            responder,
            transient: None,
            turn: 0,
            shut_down: false,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    // ---- accessors ----

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.playback.is_speaking()
    }

    pub fn is_processing(&self) -> bool {
        self.state == TurnState::Processing
    }

    pub fn capture_supported(&self) -> bool {
        self.capture.is_supported()
    }

    pub fn playback_supported(&self) -> bool {
        self.playback.is_supported()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Visible error text; `None` once the display window has passed
    pub fn transient_error(&self) -> Option<&str> {
        let now = Instant::now();
        self.transient
            .as_ref()
            .filter(|e| !e.is_expired(self.config.error_display, now))
            .map(|e| e.message())
    }

    /// Current state as the rendering layer sees it
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            messages: self.log.messages().to_vec(),
            state: self.state,
            is_listening: self.is_listening(),
            is_speaking: self.is_speaking(),
            is_processing: self.is_processing(),
            connection: self.connection,
            error: self.transient_error().map(str::to_string),
            capture_supported: self.capture.is_supported(),
            playback_supported: self.playback.is_supported(),
            language: self.language,
        }
    }

    /// Command/observation handle for this controller
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle::new(self.events_tx.clone(), self.snapshot_tx.subscribe())
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ---- commands ----

    /// Start a turn from typed or recognized text
    ///
    /// Any active capture or playback is stopped first. The user message is
    /// appended and the full history, ending with it, goes to the responder.
    pub fn submit(&mut self, text: &str) -> Submission {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty submission");
            return Submission::Empty;
        }
        if self.state == TurnState::Processing {
            debug!("Ignoring submission while turn {} is outstanding", self.turn);
            return Submission::Busy;
        }

        self.capture.stop();
        self.playback.stop();

        self.log.append(Message::user(text));
        let history = self.log.to_history();

        self.turn += 1;
        let turn = self.turn;
        self.state = TurnState::Processing;
        info!("Turn {} submitted ({} history entries)", turn, history.len());

        let responder = Arc::clone(&self.responder);
        let tx = self.events_tx.clone();
        let message = text.to_string();
        tokio::spawn(async move {
            let result = responder.reply(&message, &history).await;
            let _ = tx.send(ControllerEvent::ReplyReceived { turn, result });
        });

        self.commit();
        Submission::Accepted
    }

    /// Start listening, or stop the current capture
    pub fn toggle_capture(&mut self) {
        if self.state == TurnState::Processing {
            debug!("Ignoring capture toggle while turn {} is outstanding", self.turn);
            return;
        }

        if self.capture.is_listening() {
            self.capture.stop();
            self.state = TurnState::Idle;
            self.commit();
            return;
        }

        if !self.capture.is_supported() {
            self.raise(CaptureStartError::NotSupported.user_message());
            self.commit();
            return;
        }

        // capture pre-empts playback
        self.playback.stop();

        let tx = self.events_tx.clone();
        let locale = self.language.locale_code();
        match self.capture.start(locale, move |id| capture_sink(tx, id)) {
            Ok(_) => self.state = TurnState::Listening,
            Err(e) => {
                warn!("{}", e);
                self.state = TurnState::Idle;
                self.raise(e.user_message());
            }
        }
        self.commit();
    }

    /// Switch language, ending any capture or playback in progress
    pub fn set_language(&mut self, language: Language) {
        self.capture.stop();
        self.playback.stop();
        if matches!(self.state, TurnState::Listening | TurnState::Speaking) {
            self.state = TurnState::Idle;
        }

        if language != self.language {
            info!("Language changed: {} -> {}", self.language, language);
            self.language = language;
        }
        self.commit();
    }

    /// Check reachability in the background
    pub fn probe_connection(&mut self) {
        let responder = Arc::clone(&self.responder);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = responder.probe().await;
            let _ = tx.send(ControllerEvent::ProbeCompleted(result));
        });
    }

    /// End every session; later events are ignored
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        info!("Shutting down turn controller");
        self.capture.abort();
        self.playback.stop();
        if self.state != TurnState::Processing {
            self.state = TurnState::Idle;
        }
        self.shut_down = true;
        self.commit();
    }

    // ---- event loop ----

    /// Apply one event; returns false once the controller has shut down
    pub fn dispatch(&mut self, event: ControllerEvent) -> bool {
        if self.shut_down {
            debug!("Ignoring {:?} after shutdown", event);
            return false;
        }

        match event {
            ControllerEvent::Submit(text) => {
                self.submit(&text);
            }
            ControllerEvent::ToggleCapture => self.toggle_capture(),
            ControllerEvent::SetLanguage(language) => self.set_language(language),
            ControllerEvent::Probe => self.probe_connection(),
            ControllerEvent::Capture { session, event } => self.on_capture(session, event),
            ControllerEvent::Playback { session, event } => self.on_playback(session, event),
            ControllerEvent::ReplyReceived { turn, result } => self.on_reply(turn, result),
            ControllerEvent::ProbeCompleted(result) => self.on_probe(result),
            ControllerEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        }

        self.commit();
        !self.shut_down
    }

    /// Wait for and apply the next event
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.dispatch(event),
            None => false,
        }
    }

    /// Apply every event already queued; returns how many were applied
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            applied += 1;
            if !self.dispatch(event) {
                break;
            }
        }
        applied
    }

    /// Drop the transient error if its window has passed
    pub fn clear_expired_error(&mut self) -> bool {
        let window = self.config.error_display;
        let now = Instant::now();
        if self
            .transient
            .as_ref()
            .is_some_and(|e| e.is_expired(window, now))
        {
            self.transient = None;
            self.commit();
            return true;
        }
        false
    }

    /// Run until shutdown, probing connectivity first
    ///
    /// Also returns, tearing capture and playback down, once every handle
    /// and snapshot receiver has been dropped.
    pub async fn run(mut self) {
        info!("Turn controller running");
        self.probe_connection();

        loop {
            let deadline = self
                .transient
                .as_ref()
                .and_then(|e| e.expires_at(self.config.error_display));

            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => {
                            if !self.dispatch(event) {
                                break;
                            }
                        }
                        None => {
                            self.shutdown();
                            break;
                        }
                    }
                }
                _ = sleep_until(deadline) => {
                    self.clear_expired_error();
                }
                _ = self.snapshot_tx.closed() => {
                    debug!("All controller handles dropped");
                    self.shutdown();
                    break;
                }
            }
        }

        info!("Turn controller stopped");
    }

    // ---- event handlers ----

    fn on_capture(&mut self, session: SessionId, event: CaptureEvent) {
        match self.capture.handle(session, event) {
            None => {}
            Some(CaptureOutcome::Completed(text)) => {
                self.finish_listening();
                if text.is_empty() {
                    debug!("Recognizer returned an empty transcript");
                } else {
                    self.submit(&text);
                }
            }
            Some(CaptureOutcome::Failed(error)) => {
                self.finish_listening();
                self.raise(error.user_message());
            }
            Some(CaptureOutcome::Ended) => self.finish_listening(),
        }
    }

    fn on_playback(&mut self, session: SessionId, event: PlaybackEvent) {
        match self.playback.handle(session, event) {
            None => {}
            Some(PlaybackOutcome::Finished) => self.finish_speaking(),
            Some(PlaybackOutcome::Failed(error)) => {
                warn!("{}", error);
                self.finish_speaking();
                self.raise(PLAYBACK_ERROR_MESSAGE);
            }
        }
    }

    fn on_reply(&mut self, turn: u64, result: Result<String, RemoteError>) {
        if turn != self.turn || self.state != TurnState::Processing {
            debug!("Discarding reply for stale turn {}", turn);
            return;
        }

        match result {
            Ok(reply) => {
                self.connection = ConnectionStatus::Connected;
                info!("Turn {} answered", turn);
                self.log.append(Message::assistant(reply.clone()));
                self.state = TurnState::Idle;
                self.speak(&reply);
            }
            Err(error) => {
                warn!("Turn {} failed: {}", turn, error);
                self.connection = ConnectionStatus::Disconnected;
                self.log.append(Message::assistant(FALLBACK_REPLY));
                self.state = TurnState::Idle;
                self.raise(REMOTE_ERROR_MESSAGE);
            }
        }
    }

    fn on_probe(&mut self, result: Result<(), RemoteError>) {
        self.connection = match result {
            Ok(()) => {
                debug!("Responder reachable");
                ConnectionStatus::Connected
            }
            Err(error) => {
                warn!("Responder probe failed: {}", error);
                ConnectionStatus::Disconnected
            }
        };
    }

    // ---- helpers ----

    fn speak(&mut self, text: &str) {
        if text.trim().is_empty() || !self.playback.is_supported() {
            return;
        }

        let explicit = (!self.config.detect_reply_language).then_some(self.language);
        let plan = plan_voice(&self.playback.voices(), text, explicit);

        self.capture.stop();
        let tx = self.events_tx.clone();
        match self
            .playback
            .speak(text, plan.voice, &plan.locale, move |id| playback_sink(tx, id))
        {
            Ok(_) => self.state = TurnState::Speaking,
            Err(PlaybackError::Unsupported) => {}
            Err(PlaybackError::PlatformFailure(e)) => {
                debug!("Playback did not start: {}", e);
                self.raise(PLAYBACK_ERROR_MESSAGE);
            }
        }
    }

    fn finish_listening(&mut self) {
        if self.state == TurnState::Listening {
            self.state = TurnState::Idle;
        }
    }

    fn finish_speaking(&mut self) {
        if self.state == TurnState::Speaking {
            self.state = TurnState::Idle;
        }
    }

    /// Show `message`, replacing any visible error
    fn raise(&mut self, message: impl Into<String>) {
        let error = TransientError::new(message);
        debug!("Transient error: {}", error.message());
        self.transient = Some(error);
    }

    fn commit(&mut self) {
        debug_assert!(
            !(self.capture.is_listening() && self.playback.is_speaking()),
            "capture and playback active at once"
        );
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

fn capture_sink(tx: mpsc::UnboundedSender<ControllerEvent>, session: SessionId) -> EventSink<CaptureEvent> {
    EventSink::new(session, move |session, event| {
        tx.send(ControllerEvent::Capture { session, event }).is_ok()
    })
}

fn playback_sink(tx: mpsc::UnboundedSender<ControllerEvent>, session: SessionId) -> EventSink<PlaybackEvent> {
    EventSink::new(session, move |session, event| {
        tx.send(ControllerEvent::Playback { session, event }).is_ok()
    })
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
