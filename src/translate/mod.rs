//! Trigger coalescing and the translation worker.
//!
//! ```text
//! KeyEventFilter ──► [TriggerSlot (cap 1)] ──► TranslationWorker ──► KeySink
//!                        │                            │
//!                   full ⇒ coalesce                   └──► Vibrator (key-down only)
//! ```
//!
//! The slot holds at most one pending run. Requests that find it full fold
//! into the pending run, which reads the freshest key state when it executes.

pub mod slot;
pub mod worker;

pub use slot::{trigger_slot, Trigger, TriggerOutcome, TriggerSlot};
pub use worker::{TranslationWorker, WorkerHandle};
