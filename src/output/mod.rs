//! Synthetic output device: the write side of the translation.

pub mod device;

pub use device::{
    build_output_sink, key_capabilities, DeviceLifecycle, OutputDevice, DEVICE_NAME, DEVICE_PHYS,
    TRANSLATED_KEY,
};

use thiserror::Error;

/// Errors from the virtual output device.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to allocate virtual device: {0}")]
    AllocationFailure(String),

    #[error("Failed to register virtual device: {0}")]
    RegistrationFailure(String),

    #[error("Failed to emit key event: {0}")]
    EmitFailure(String),
}

/// Write seam the translation worker emits through.
///
/// One call produces the key event and its synchronization marker as an
/// indivisible batch; implementations must not let another emission
/// interleave inside it.
pub trait KeySink: Send + 'static {
    fn emit_pair(&mut self, pressed: bool) -> Result<(), OutputError>;
}
