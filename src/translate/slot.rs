//! Capacity-1 trigger channel between the event filter and the worker.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Marker for a pending translation run. Carries no payload: the worker
/// reads the key state at run time, not at schedule time.
#[derive(Debug)]
pub struct Trigger;

/// What happened to a translation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The request was queued and will produce one translation run.
    Scheduled,
    /// A run was already pending; this request folds into it.
    Coalesced,
    /// The worker is gone, nothing will run.
    Closed,
}

/// Send side of the trigger channel.
///
/// The single slot is the coalescing policy: rapid key transitions collapse
/// into one run that observes the freshest state. Requesting against a full
/// slot is a normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct TriggerSlot {
    tx: mpsc::Sender<Trigger>,
}

/// Creates the slot and the receive side consumed by the worker.
pub fn trigger_slot() -> (TriggerSlot, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(1);
    (TriggerSlot { tx }, rx)
}

impl TriggerSlot {
    /// Requests one translation run. Never blocks.
    pub fn request(&self) -> TriggerOutcome {
        match self.tx.try_send(Trigger) {
            Ok(()) => TriggerOutcome::Scheduled,
            Err(TrySendError::Full(_)) => TriggerOutcome::Coalesced,
            Err(TrySendError::Closed(_)) => TriggerOutcome::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_schedules_follow_ups_coalesce() {
        let (slot, mut rx) = trigger_slot();

        assert_eq!(slot.request(), TriggerOutcome::Scheduled);
        assert_eq!(slot.request(), TriggerOutcome::Coalesced);
        assert_eq!(slot.request(), TriggerOutcome::Coalesced);

        // Exactly one trigger is queued.
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn slot_frees_up_after_the_run_is_taken() {
        let (slot, mut rx) = trigger_slot();

        assert_eq!(slot.request(), TriggerOutcome::Scheduled);
        assert!(rx.recv().await.is_some());
        assert_eq!(slot.request(), TriggerOutcome::Scheduled);
    }

    #[tokio::test]
    async fn requests_after_worker_exit_report_closed() {
        let (slot, rx) = trigger_slot();
        drop(rx);
        assert_eq!(slot.request(), TriggerOutcome::Closed);
    }
}
