//! Per-event translation decision.

use crate::state::SharedState;
use crate::translate::{TriggerOutcome, TriggerSlot};
use evdev::{InputEvent, InputEventKind};
use tracing::{debug, warn};

/// Decides, for each raw input event, whether it drives a translation.
///
/// The decision order is fixed: non-key events pass through, key events
/// while the display sleeps are ignored entirely, and every other key event
/// updates the pressed flag and requests one run. The return value is the
/// consumed flag: `true` means the event was claimed for translation.
#[derive(Debug, Clone)]
pub struct KeyEventFilter {
    state: SharedState,
    slot: TriggerSlot,
}

impl KeyEventFilter {
    pub fn new(state: SharedState, slot: TriggerSlot) -> Self {
        Self { state, slot }
    }

    pub fn filter_event(&self, event: &InputEvent) -> bool {
        let key = match event.kind() {
            InputEventKind::Key(key) => key,
            _ => return false,
        };

        // Asleep means no trace of the event: no flag update, no trigger.
        if self.state.display_asleep() {
            return false;
        }

        let pressed = event.value() > 0;
        self.state.set_pressed(pressed);

        match self.slot.request() {
            TriggerOutcome::Scheduled => debug!(
                "Key {:?} value {} scheduled a translation run",
                key,
                event.value()
            ),
            TriggerOutcome::Coalesced => debug!(
                "Key {:?} value {} coalesced into the pending run",
                key,
                event.value()
            ),
            TriggerOutcome::Closed => {
                warn!("Translation worker is gone, key {:?} dropped", key)
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::trigger_slot;
    use evdev::{EventType, Key};

    fn key_event(key: Key, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), value)
    }

    #[test]
    fn non_key_events_pass_through_untouched() {
        let state = SharedState::new();
        let (slot, mut rx) = trigger_slot();
        let filter = KeyEventFilter::new(state.clone(), slot);

        let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        let rel = InputEvent::new(EventType::RELATIVE, 0, 3);

        assert!(!filter.filter_event(&sync));
        assert!(!filter.filter_event(&rel));
        assert!(!state.pressed());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn key_down_while_awake_is_consumed_and_scheduled() {
        let state = SharedState::new();
        let (slot, mut rx) = trigger_slot();
        let filter = KeyEventFilter::new(state.clone(), slot);

        assert!(filter.filter_event(&key_event(Key::KEY_A, 1)));
        assert!(state.pressed());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn key_up_clears_the_pressed_flag() {
        let state = SharedState::new();
        let (slot, mut rx) = trigger_slot();
        let filter = KeyEventFilter::new(state.clone(), slot);

        state.set_pressed(true);
        assert!(filter.filter_event(&key_event(Key::KEY_A, 0)));
        assert!(!state.pressed());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn autorepeat_counts_as_pressed() {
        let state = SharedState::new();
        let (slot, _rx) = trigger_slot();
        let filter = KeyEventFilter::new(state.clone(), slot);

        assert!(filter.filter_event(&key_event(Key::KEY_A, 2)));
        assert!(state.pressed());
    }

    #[test]
    fn key_events_while_asleep_leave_no_trace() {
        let state = SharedState::new();
        let (slot, mut rx) = trigger_slot();
        let filter = KeyEventFilter::new(state.clone(), slot);

        state.set_display_asleep(true);

        assert!(!filter.filter_event(&key_event(Key::KEY_A, 1)));
        assert!(!state.pressed());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn bursts_are_consumed_but_coalesce_to_one_trigger() {
        let state = SharedState::new();
        let (slot, mut rx) = trigger_slot();
        let filter = KeyEventFilter::new(state.clone(), slot);

        assert!(filter.filter_event(&key_event(Key::KEY_A, 1)));
        assert!(filter.filter_event(&key_event(Key::KEY_A, 0)));
        assert!(filter.filter_event(&key_event(Key::KEY_A, 1)));

        // The burst folded into a single pending run, and the flag holds
        // the final transition.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(state.pressed());
    }
}
