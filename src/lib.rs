//! Hardware key to home-key translation.
//!
//! Watches raw key events from the system's input devices, re-emits them as
//! home button presses on a synthetic keyboard, suppresses translation while
//! the display is blanked, and pulses the vibrator on key-down.

pub mod config;
pub mod filter;
pub mod haptics;
pub mod output;
pub mod power;
pub mod service;
pub mod state;
pub mod translate;

pub use config::RuntimeConfig;
pub use service::{ComponentStatus, InitReport, ServiceHandle};
pub use state::SharedState;
