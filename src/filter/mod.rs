//! Raw event interception: device attachment and the per-event decision.

pub mod event_filter;
pub mod input_handler;

pub use event_filter::KeyEventFilter;
pub use input_handler::{device_matches, InputHandler, InputHandlerHandle, REJECTED_NAME_FRAGMENT};

use thiserror::Error;

/// Errors from the input side.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Input device not available: {0}")]
    DeviceUnavailable(String),
}
