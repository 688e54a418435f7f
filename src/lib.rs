//! Voice Companion - multilingual voice chat client
//!
//! A conversational front end that:
//! - Captures one utterance at a time through platform speech recognition
//! - Sends it with the running history to a remote responder
//! - Speaks the reply in a voice matching its script (English, Hindi, Marathi)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voice_companion::agent::HttpResponder;
//! use voice_companion::config::Config;
//! use voice_companion::turn::{ControllerConfig, TurnController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let responder = HttpResponder::from_config(&config.responder)?;
//!     let controller = TurnController::new(
//!         ControllerConfig::from_config(&config),
//!         Arc::new(responder),
//!         None,
//!         None,
//!     );
//!     let handle = controller.handle();
//!     tokio::spawn(controller.run());
//!     handle.submit("Hello")?;
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod error;
pub mod language;
pub mod agent;
pub mod voice;
pub mod turn;
pub mod config;
pub mod cli;

pub use agent::{ConversationLog, HttpResponder, Responder};
pub use config::Config;
pub use language::{Language, LanguageInfo};
pub use turn::{ControllerHandle, ControllerSnapshot, TurnController, TurnState};
pub use types::{HistoryEntry, Message, Role};
