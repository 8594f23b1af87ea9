//! `app` holds the interactive state and turns key presses into actions.
//!
//! Key handling never touches the session directly: it queues an
//! [`Action`], and [`App::dispatch`] performs the one session operation that
//! action stands for after the UI has been redrawn.

/// `actions` module: action queue and dispatch.
mod actions;
/// `init` module: construction of `App`.
mod init;
/// `keyboard` module: key routing for shortcuts and the question input.
mod keyboard;
/// `overlays` module: language, file and sample-question pickers.
mod overlays;
/// `state` module: `App` and the UI state types it owns.
mod state;

pub use state::{
    Action, App, Composer, ListPicker, Notice, NoticeLevel, OverlayState, SAMPLE_QUESTIONS,
};
