//! opsdeck-app - Application state and orchestration for opsdeck
//!
//! This crate implements the TEA (The Elm Architecture) pattern for state
//! management: per-kind operation lifecycles, the telemetry polling
//! controller, bounded histories, configuration loading, and the Engine that
//! ties them to the backend client.

pub mod actions;
pub mod config;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod message;
pub mod process;
pub mod signals;
pub mod state;

// Re-export primary types
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{UpdateAction, UpdateResult};
pub use message::Message;
pub use state::{AppState, View, COMMAND_PRESETS};
