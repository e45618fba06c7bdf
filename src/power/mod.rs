//! Display power observation.
//!
//! Translation is gated on the display being awake. The blank model and the
//! notifier are the core; the sysfs watcher is the host-facing edge.

pub mod blank;
pub mod watcher;

pub use blank::{BlankNotifier, DisplayBlank};
pub use watcher::{FbBlankWatcher, WatcherHandle};
