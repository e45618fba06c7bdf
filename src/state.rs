//! Shared runtime state passed to the filter, the worker and the power observer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Vibration strength written to the actuator on every key-down, in actuator units.
pub const VIB_STRENGTH: u32 = 20;

/// Cloneable context shared by the event pipeline.
///
/// One instance is created when the service starts and dropped when it stops.
/// Every component receives a clone instead of reaching for global state, so
/// several services can coexist in one process (and in tests).
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<StateInner>,
}

#[derive(Debug)]
struct StateInner {
    // Last observed key transition, read by the worker at run time.
    pressed: AtomicBool,
    // Mirrors the display blank state, written by the power observer.
    display_asleep: AtomicBool,
    vib_strength: u32,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StateInner {
                pressed: AtomicBool::new(false),
                display_asleep: AtomicBool::new(false),
                vib_strength: VIB_STRENGTH,
            }),
        }
    }

    pub fn pressed(&self) -> bool {
        self.inner.pressed.load(Ordering::Relaxed)
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.inner.pressed.store(pressed, Ordering::Relaxed);
    }

    pub fn display_asleep(&self) -> bool {
        self.inner.display_asleep.load(Ordering::Relaxed)
    }

    pub fn set_display_asleep(&self, asleep: bool) {
        self.inner.display_asleep.store(asleep, Ordering::Relaxed);
    }

    pub fn vib_strength(&self) -> u32 {
        self.inner.vib_strength
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_released_and_awake() {
        let state = SharedState::new();
        assert!(!state.pressed());
        assert!(!state.display_asleep());
        assert_eq!(state.vib_strength(), 20);
    }

    #[test]
    fn clones_share_the_same_flags() {
        let state = SharedState::new();
        let clone = state.clone();

        state.set_pressed(true);
        clone.set_display_asleep(true);

        assert!(clone.pressed());
        assert!(state.display_asleep());
    }
}
