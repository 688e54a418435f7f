//! Turn taking
//!
//! The turn controller sequences capture, the remote reply and playback for
//! each conversation turn. It is a single actor: every input (UI command,
//! platform event, network completion) arrives as a [`ControllerEvent`] on
//! one channel and is processed in arrival order.
//!
//! ```text
//!            toggle            result / submit            reply ok
//!   Idle ───────────▶ Listening ───────────────▶ Processing ────────▶ Speaking
//!    ▲ ▲                 │ error / stop             │ reply failed       │
//!    │ └─────────────────┘                          │                    │
//!    ├──────────────────────────────────────────────┘                    │
//!    └───────────────────────── playback finished / failed ─────────────┘
//! ```

pub mod controller;
pub mod handle;
pub mod transient;

pub use controller::{
    ConnectionStatus, ControllerConfig, ControllerEvent, Submission, TurnController, TurnState,
    FALLBACK_REPLY, PLAYBACK_ERROR_MESSAGE, REMOTE_ERROR_MESSAGE,
};
pub use handle::{ControllerHandle, ControllerSnapshot, HandleError};
pub use transient::TransientError;
