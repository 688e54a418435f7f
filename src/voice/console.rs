//! Terminal stand-ins for the platform speech services
//!
//! The console has no microphone or speaker, so the chat REPL drives these:
//! while a capture session is open the next typed line is delivered as the
//! recognized utterance, and "speaking" a reply takes time proportional to
//! its length without producing audio.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::voice::capture::SpeechRecognizer;
use crate::voice::events::{CaptureEvent, EventSink, PlaybackEvent};
use crate::voice::playback::{SpeechSynthesizer, Utterance};
use crate::voice::selector::Voice;

/// Time per word at rate 1.0
const WORD_PACE: Duration = Duration::from_millis(250);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared line-input "microphone"
#[derive(Clone, Default)]
pub struct ConsoleMicrophone {
    open: Arc<Mutex<Option<EventSink<CaptureEvent>>>>,
}

impl ConsoleMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognizer that listens through this microphone
    pub fn recognizer(&self) -> ConsoleRecognizer {
        ConsoleRecognizer { mic: self.clone() }
    }

    /// Whether a capture session is waiting for a line
    pub fn is_open(&self) -> bool {
        lock(&self.open).is_some()
    }

    /// Deliver `line` as the utterance; false when nobody is listening
    pub fn hear(&self, line: &str) -> bool {
        match lock(&self.open).take() {
            Some(sink) => {
                debug!("Console microphone heard {:?} ({})", line, sink.session());
                sink.emit(CaptureEvent::Result(line.to_string()))
            }
            None => false,
        }
    }

    fn close(&self) -> Option<EventSink<CaptureEvent>> {
        lock(&self.open).take()
    }
}

impl std::fmt::Debug for ConsoleMicrophone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleMicrophone")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Recognizer fed by typed lines
#[derive(Debug)]
pub struct ConsoleRecognizer {
    mic: ConsoleMicrophone,
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self, locale: &str, events: EventSink<CaptureEvent>) -> Result<(), String> {
        info!("Console microphone open ({})", locale);
        events.emit(CaptureEvent::Started);
        *lock(&self.mic.open) = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.mic.close() {
            sink.emit(CaptureEvent::Ended);
        }
    }

    fn abort(&mut self) {
        self.mic.close();
    }
}

/// Voices a typical desktop platform ships with
pub fn default_voices() -> Vec<Voice> {
    vec![
        Voice::new("Samantha", "en-US"),
        Voice::new("Daniel", "en-GB"),
        Voice::new("Lekha", "hi-IN"),
    ]
}

/// Silent synthesizer that paces utterances by word count
pub struct ConsoleSynthesizer {
    voices: Vec<Voice>,
    pace: Duration,
    current: Option<JoinHandle<()>>,
}

impl ConsoleSynthesizer {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            pace: WORD_PACE,
            current: None,
        }
    }

    /// Override the per-word pace
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    fn duration_of(&self, utterance: &Utterance) -> Duration {
        let words = utterance.text.split_whitespace().count().max(1) as u32;
        (self.pace * words).div_f32(utterance.rate.max(0.1))
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new(default_voices())
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance, events: EventSink<PlaybackEvent>) -> Result<(), String> {
        self.cancel();

        let duration = self.duration_of(&utterance);
        info!(
            "Speaking {} words in {} ({:?})",
            utterance.text.split_whitespace().count(),
            utterance.locale,
            duration
        );

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;
        self.current = Some(runtime.spawn(async move {
            events.emit(PlaybackEvent::Started);
            tokio::time::sleep(duration).await;
            events.emit(PlaybackEvent::Finished);
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            task.abort();
        }
    }
}

impl Drop for ConsoleSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}
