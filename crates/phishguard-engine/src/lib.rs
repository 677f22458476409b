//! PhishGuard injection engine
//!
//! The tick-driven core that keeps an action control and a verdict panel
//! synchronized with a webmail document tree it does not own:
//! - [`state`]: UI state flags and the pure per-tick decision function
//! - [`controller`]: the [`InjectionEngine`] applying decisions and running
//!   activations with busy exclusivity
//! - [`trigger`]: the merged mutation/timer tick source and the event loop
//! - [`config`]: tunable settings for the driver binary
//! - [`sim`]: a scripted end-to-end session over fixture markup

pub mod config;
pub mod controller;
pub mod sim;
pub mod state;
pub mod trigger;

pub use config::EngineConfig;
pub use controller::{InjectionEngine, CONTROL_ID, LABEL_BUSY, LABEL_IDLE, LABEL_RESCAN};
pub use state::{decide, EngineUiState, TickAction};
pub use trigger::{run_engine, spawn_trigger, EngineEvent, DEFAULT_TICK_PERIOD};
