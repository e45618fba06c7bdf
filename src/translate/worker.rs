//! Single-consumer worker that turns triggers into output events.

use crate::haptics::Vibrator;
use crate::output::KeySink;
use crate::state::SharedState;
use crate::translate::Trigger;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Drains the trigger slot and performs one translation per trigger.
///
/// The worker is the only concurrency context that touches the output sink
/// and the vibrator, so translation runs are serialized by construction.
/// Each run reads the pressed flag at run time; a coalesced burst of key
/// transitions therefore produces one run with the final state.
pub struct TranslationWorker {
    state: SharedState,
    trigger_rx: mpsc::Receiver<Trigger>,
    sink: Box<dyn KeySink>,
    vibrator: Box<dyn Vibrator>,
}

impl TranslationWorker {
    /// Spawns the worker task. It owns the sink until the trigger slot
    /// closes and every pending run has completed.
    pub fn spawn(
        state: SharedState,
        trigger_rx: mpsc::Receiver<Trigger>,
        sink: Box<dyn KeySink>,
        vibrator: Box<dyn Vibrator>,
    ) -> WorkerHandle {
        info!("Starting translation worker");

        let worker = Self {
            state,
            trigger_rx,
            sink,
            vibrator,
        };
        let task_handle = tokio::spawn(worker.run());

        WorkerHandle {
            task_handle: Some(task_handle),
        }
    }

    async fn run(mut self) {
        while let Some(Trigger) = self.trigger_rx.recv().await {
            self.run_translation();
        }

        // All slot senders are gone; the sink is released only now,
        // after the final run.
        info!("Trigger slot closed, translation worker stopping");
    }

    fn run_translation(&mut self) {
        let pressed = self.state.pressed();

        if pressed {
            if let Err(e) = self.vibrator.pulse(self.state.vib_strength()) {
                warn!("Vibration pulse failed: {}", e);
            }
        }

        match self.sink.emit_pair(pressed) {
            Ok(()) => debug!(
                "Emitted home key {}",
                if pressed { "press" } else { "release" }
            ),
            Err(e) => warn!("Failed to emit home key event: {}", e),
        }
    }
}

/// Handle for the worker task.
pub struct WorkerHandle {
    task_handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Waits for the worker to drain and exit. When this returns, the output
    /// sink has been dropped and no translation run is in flight.
    pub async fn join(mut self) {
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                error!("Translation worker task panicked: {}", e);
            }
        }
    }
}
