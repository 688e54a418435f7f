//! Shared fakes for controller tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use voice_companion::error::{CaptureError, RemoteError};
use voice_companion::turn::{ControllerConfig, TurnController};
use voice_companion::types::HistoryEntry;
use voice_companion::voice::{
    CaptureEvent, EventSink, PlaybackEvent, SpeechRecognizer, SpeechSynthesizer, Utterance, Voice,
};
use voice_companion::Responder;

pub const GREETING: &str = "Namaste! Hello! How can I help you today?";

/// Responder that answers from a queue and records every request
#[derive(Default)]
pub struct ScriptedResponder {
    replies: Mutex<VecDeque<Result<String, RemoteError>>>,
    requests: Mutex<Vec<(String, Vec<HistoryEntry>)>>,
    probe_error: Mutex<Option<RemoteError>>,
}

impl ScriptedResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replying(replies: Vec<Result<String, RemoteError>>) -> Arc<Self> {
        let responder = Self::default();
        *responder.replies.lock().unwrap() = replies.into();
        Arc::new(responder)
    }

    pub fn fail_probe(&self, error: RemoteError) {
        *self.probe_error.lock().unwrap() = Some(error);
    }

    pub fn requests(&self) -> Vec<(String, Vec<HistoryEntry>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn reply(&self, message: &str, history: &[HistoryEntry]) -> Result<String, RemoteError> {
        self.requests
            .lock()
            .unwrap()
            .push((message.to_string(), history.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    async fn probe(&self) -> Result<(), RemoteError> {
        match self.probe_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct PlatformLog {
    voices: Vec<Voice>,
    fail_capture_start: Option<String>,
    fail_speak: Option<String>,
    capture_sink: Option<EventSink<CaptureEvent>>,
    capture_locales: Vec<String>,
    capture_stops: usize,
    capture_aborts: usize,
    playback_sink: Option<EventSink<PlaybackEvent>>,
    spoken: Vec<Utterance>,
    cancels: usize,
}

/// Recognizer and synthesizer pair sharing one log
///
/// Sinks are kept after a session ends so tests can deliver late events.
#[derive(Clone, Default)]
pub struct FakePlatform(Arc<Mutex<PlatformLog>>);

impl FakePlatform {
    pub fn new() -> Self {
        Self::with_voices(vec![
            Voice::new("Samantha", "en-US"),
            Voice::new("Lekha", "hi-IN"),
        ])
    }

    pub fn with_voices(voices: Vec<Voice>) -> Self {
        let platform = Self::default();
        platform.0.lock().unwrap().voices = voices;
        platform
    }

    pub fn recognizer(&self) -> Box<dyn SpeechRecognizer> {
        Box::new(FakeRecognizer(self.clone()))
    }

    pub fn synthesizer(&self) -> Box<dyn SpeechSynthesizer> {
        Box::new(FakeSynthesizer(self.clone()))
    }

    pub fn fail_capture_start(&self, reason: &str) {
        self.0.lock().unwrap().fail_capture_start = Some(reason.to_string());
    }

    pub fn fail_speak(&self, reason: &str) {
        self.0.lock().unwrap().fail_speak = Some(reason.to_string());
    }

    fn capture_sink(&self) -> EventSink<CaptureEvent> {
        self.0
            .lock()
            .unwrap()
            .capture_sink
            .clone()
            .expect("capture was never started")
    }

    fn playback_sink(&self) -> EventSink<PlaybackEvent> {
        self.0
            .lock()
            .unwrap()
            .playback_sink
            .clone()
            .expect("nothing was ever spoken")
    }

    /// Deliver a final transcript on the most recent capture session
    pub fn hear(&self, text: &str) {
        self.capture_sink().emit(CaptureEvent::Result(text.to_string()));
    }

    pub fn capture_error(&self, error: CaptureError) {
        self.capture_sink().emit(CaptureEvent::Failed(error));
    }

    pub fn capture_ended(&self) {
        self.capture_sink().emit(CaptureEvent::Ended);
    }

    pub fn finish_speaking(&self) {
        self.playback_sink().emit(PlaybackEvent::Finished);
    }

    pub fn speaking_failed(&self, reason: &str) {
        self.playback_sink()
            .emit(PlaybackEvent::Failed(reason.to_string()));
    }

    pub fn has_capture_sink(&self) -> bool {
        self.0.lock().unwrap().capture_sink.is_some()
    }

    pub fn has_playback_sink(&self) -> bool {
        self.0.lock().unwrap().playback_sink.is_some()
    }

    pub fn capture_locales(&self) -> Vec<String> {
        self.0.lock().unwrap().capture_locales.clone()
    }

    pub fn capture_stops(&self) -> usize {
        self.0.lock().unwrap().capture_stops
    }

    pub fn capture_aborts(&self) -> usize {
        self.0.lock().unwrap().capture_aborts
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.0.lock().unwrap().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.0.lock().unwrap().cancels
    }
}

struct FakeRecognizer(FakePlatform);

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, locale: &str, events: EventSink<CaptureEvent>) -> Result<(), String> {
        let mut log = (self.0).0.lock().unwrap();
        if let Some(reason) = log.fail_capture_start.clone() {
            return Err(reason);
        }
        log.capture_locales.push(locale.to_string());
        log.capture_sink = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        (self.0).0.lock().unwrap().capture_stops += 1;
    }

    fn abort(&mut self) {
        (self.0).0.lock().unwrap().capture_aborts += 1;
    }
}

struct FakeSynthesizer(FakePlatform);

impl SpeechSynthesizer for FakeSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        (self.0).0.lock().unwrap().voices.clone()
    }

    fn speak(&mut self, utterance: Utterance, events: EventSink<PlaybackEvent>) -> Result<(), String> {
        let mut log = (self.0).0.lock().unwrap();
        if let Some(reason) = log.fail_speak.clone() {
            return Err(reason);
        }
        log.spoken.push(utterance);
        log.playback_sink = Some(events);
        Ok(())
    }

    fn cancel(&mut self) {
        (self.0).0.lock().unwrap().cancels += 1;
    }
}

pub fn config() -> ControllerConfig {
    ControllerConfig {
        greeting: GREETING.to_string(),
        ..ControllerConfig::default()
    }
}

/// Controller wired to the fakes with both speech services available
pub fn controller(responder: Arc<ScriptedResponder>, platform: &FakePlatform) -> TurnController {
    controller_with(config(), responder, platform)
}

pub fn controller_with(
    config: ControllerConfig,
    responder: Arc<ScriptedResponder>,
    platform: &FakePlatform,
) -> TurnController {
    TurnController::new(
        config,
        responder,
        Some(platform.recognizer()),
        Some(platform.synthesizer()),
    )
}

/// Let spawned responder tasks finish and apply everything they posted
pub async fn settle(controller: &mut TurnController) {
    for _ in 0..8 {
        tokio::task::yield_now().await;
        controller.drain_pending();
    }
}
