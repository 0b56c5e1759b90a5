//! Application orchestration layer
//!
//! The state machine decides what happens for each input; on Windows the
//! controller carries the resulting effects out against the real windows.

#[cfg(windows)]
pub mod controller;
pub mod state;

pub use state::{AppState, Effect, EventContext, StateEvent};
