//! Display blank model and the observer that gates translation on it.

use crate::state::SharedState;
use tracing::{debug, info};

/// Framebuffer blank levels as reported by the kernel.
///
/// Only `Unblank` counts as "display awake"; every other level suspends
/// translation until the next unblank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayBlank {
    Unblank,
    NormalBlank,
    VsyncSuspend,
    HsyncSuspend,
    Powerdown,
}

impl DisplayBlank {
    /// Maps a raw blank code to a known level. Unknown codes yield `None`
    /// and must be ignored by callers.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unblank),
            1 => Some(Self::NormalBlank),
            2 => Some(Self::VsyncSuspend),
            3 => Some(Self::HsyncSuspend),
            4 => Some(Self::Powerdown),
            _ => None,
        }
    }

    pub fn puts_display_to_sleep(self) -> bool {
        !matches!(self, Self::Unblank)
    }
}

/// Observer fed with blank transitions; flips the shared display flag.
///
/// Transport-independent on purpose: production feeds it from the sysfs
/// watcher, tests call it directly.
#[derive(Debug, Clone)]
pub struct BlankNotifier {
    state: SharedState,
}

impl BlankNotifier {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Applies a parsed blank transition to the shared state.
    pub fn notify(&self, blank: DisplayBlank) {
        let asleep = blank.puts_display_to_sleep();
        if self.state.display_asleep() != asleep {
            info!(
                "Display {} ({:?}), key translation {}",
                if asleep { "going to sleep" } else { "waking up" },
                blank,
                if asleep { "suspended" } else { "resumed" }
            );
        }
        self.state.set_display_asleep(asleep);
    }

    /// Applies a raw blank code; unknown codes are ignored without touching state.
    pub fn notify_code(&self, code: i32) {
        match DisplayBlank::from_code(code) {
            Some(blank) => self.notify(blank),
            None => debug!("Ignoring unknown blank code: {}", code),
        }
    }
}
