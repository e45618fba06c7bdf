//! Virtual output device lifecycle with statum state machine
//!
//! The uinput-backed keyboard the translated events are emitted on. Each
//! bring-up step can fail independently, and the service reports which step
//! broke instead of tearing the process down.
//!
//! # State Machine
//!
//! ```text
//! Unallocated ──► Allocated ──► Registered ──► Active
//!                 (uinput fd,    (device node   (emitting, owned
//!                  caps set)      created)       by the worker)
//! ```

use crate::output::{KeySink, OutputError};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use statum::{machine, state};
use tracing::{debug, info};

/// Fixed identity of the synthetic keyboard.
pub const DEVICE_NAME: &str = "qwerty";
pub const DEVICE_PHYS: &str = "qwerty/input0";

/// The single key the device advertises and emits.
pub const TRANSLATED_KEY: Key = Key::KEY_HOME;

/// States for the output device lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum DeviceLifecycle {
    Unallocated, // Nothing acquired yet
    Allocated,   // uinput opened, capabilities declared
    Registered,  // Device node exists in the input subsystem
    Active,      // Ready for the translation worker
}

/// Virtual output device with compile-time lifecycle safety via statum
#[machine]
pub struct OutputDevice<S: DeviceLifecycle> {
    builder: Option<VirtualDeviceBuilder<'static>>,
    device: Option<VirtualDevice>,
}

impl OutputDevice<Unallocated> {
    pub fn create() -> Self {
        debug!("Creating output device in Unallocated state");
        Self::new(None, None)
    }

    /// Opens uinput and declares the key capability, transitioning to
    /// Allocated on success.
    pub fn allocate(mut self) -> Result<OutputDevice<Allocated>, OutputError> {
        info!("Allocating virtual output device '{}'", DEVICE_NAME);

        let keys = key_capabilities();
        let builder = VirtualDeviceBuilder::new()
            .map_err(|e| OutputError::AllocationFailure(e.to_string()))?
            .name(DEVICE_NAME)
            .with_keys(&keys)
            .map_err(|e| OutputError::AllocationFailure(e.to_string()))?;

        self.builder = Some(builder);
        Ok(self.transition())
    }
}

impl OutputDevice<Allocated> {
    /// Creates the device node and transitions to Registered.
    pub fn register(mut self) -> Result<OutputDevice<Registered>, OutputError> {
        let builder = match self.builder.take() {
            Some(b) => b,
            None => {
                return Err(OutputError::RegistrationFailure(
                    "allocation incomplete".to_string(),
                ))
            }
        };

        let device = builder
            .build()
            .map_err(|e| OutputError::RegistrationFailure(e.to_string()))?;

        info!(
            "Registered virtual output device '{}' ({})",
            DEVICE_NAME, DEVICE_PHYS
        );
        self.device = Some(device);
        Ok(self.transition())
    }
}

impl OutputDevice<Registered> {
    /// Marks the device ready for the worker.
    pub fn activate(self) -> OutputDevice<Active> {
        info!("Activating virtual output device '{}'", DEVICE_NAME);
        self.transition()
    }
}

impl OutputDevice<Active> {
    /// Emits the translated key with the given state, immediately followed
    /// by a synchronization marker, as one batch.
    pub fn emit_key(&mut self, pressed: bool) -> Result<(), OutputError> {
        let device = match &mut self.device {
            Some(d) => d,
            None => {
                return Err(OutputError::EmitFailure(
                    "device not registered".to_string(),
                ))
            }
        };

        let value = i32::from(pressed);
        let events = [
            InputEvent::new(EventType::KEY, TRANSLATED_KEY.code(), value),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
        ];

        device
            .emit(&events)
            .map_err(|e| OutputError::EmitFailure(e.to_string()))
    }
}

impl KeySink for OutputDevice<Active> {
    fn emit_pair(&mut self, pressed: bool) -> Result<(), OutputError> {
        self.emit_key(pressed)
    }
}

/// The advertised capability set: exactly the translated key.
pub fn key_capabilities() -> AttributeSet<Key> {
    let mut keys = AttributeSet::<Key>::new();
    keys.insert(TRANSLATED_KEY);
    keys
}

/// Runs the full bring-up and returns the device as the worker's sink.
/// Unregistration and release happen when the sink is dropped.
pub fn build_output_sink() -> Result<Box<dyn KeySink>, OutputError> {
    let device = OutputDevice::create().allocate()?.register()?.activate();
    Ok(Box::new(device))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_set_is_exactly_the_home_key() {
        let keys = key_capabilities();
        let listed: Vec<Key> = keys.iter().collect();
        assert_eq!(listed, vec![Key::KEY_HOME]);
    }
}
