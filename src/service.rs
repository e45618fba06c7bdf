//! Service assembly, startup report and ordered shutdown.
//!
//! Bring-up never aborts the process. Components that fail to come up are
//! reported in the [`InitReport`] and skipped; everything else keeps
//! running, and power observation is registered regardless of how the
//! output device fared.

use crate::config::RuntimeConfig;
use crate::filter::{InputHandler, InputHandlerHandle, KeyEventFilter};
use crate::haptics::{SysfsVibrator, Vibrator};
use crate::output::{self, KeySink, OutputError};
use crate::power::{BlankNotifier, FbBlankWatcher, WatcherHandle};
use crate::state::SharedState;
use crate::translate::{trigger_slot, TranslationWorker, WorkerHandle};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentStatus {
    Ready,
    Degraded(String),
}

impl ComponentStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Degraded(reason) => write!(f, "degraded: {}", reason),
        }
    }
}

/// Which parts of the service came up.
#[derive(Debug, Clone)]
pub struct InitReport {
    pub output: ComponentStatus,
    pub input: ComponentStatus,
    pub power: ComponentStatus,
    pub haptics: ComponentStatus,
}

impl InitReport {
    pub fn fully_operational(&self) -> bool {
        self.output.is_ready()
            && self.input.is_ready()
            && self.power.is_ready()
            && self.haptics.is_ready()
    }
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "output: {}, input: {}, power: {}, haptics: {}",
            self.output, self.input, self.power, self.haptics
        )
    }
}

/// Running service. Dropping the handle leaks the tasks; call
/// [`ServiceHandle::shutdown`] for an ordered stop.
pub struct ServiceHandle {
    state: SharedState,
    filter: Option<Arc<KeyEventFilter>>,
    input: Option<InputHandlerHandle>,
    worker: Option<WorkerHandle>,
    watcher: Option<WatcherHandle>,
}

impl ServiceHandle {
    /// Full production wiring: uinput-backed output device, sysfs vibrator,
    /// evdev input scan and the blank watcher.
    pub async fn spawn(config: RuntimeConfig) -> (Self, InitReport) {
        let sink = output::build_output_sink();
        let vibrator: Box<dyn Vibrator> = Box::new(SysfsVibrator::new(&config.vibrator_path));
        Self::spawn_with(config, sink, vibrator).await
    }

    /// Wiring with an injected sink and vibrator. The sink argument carries
    /// the outcome of device bring-up, so a failed bring-up flows through
    /// the same degraded-start path as the production one.
    pub async fn spawn_with(
        config: RuntimeConfig,
        sink: Result<Box<dyn KeySink>, OutputError>,
        vibrator: Box<dyn Vibrator>,
    ) -> (Self, InitReport) {
        let state = SharedState::new();

        let haptics_status = match vibrator.probe() {
            Ok(()) => ComponentStatus::Ready,
            Err(e) => {
                warn!("Haptics degraded: {}", e);
                ComponentStatus::Degraded(e.to_string())
            }
        };

        // Output device, worker, filter and input scan come up together.
        // Without a device there is nothing to translate into, so the whole
        // translation path stays dark.
        let (output_status, input_status, filter, worker, input) = match sink {
            Ok(sink) => {
                let (slot, trigger_rx) = trigger_slot();
                let worker = TranslationWorker::spawn(state.clone(), trigger_rx, sink, vibrator);
                let filter = Arc::new(KeyEventFilter::new(state.clone(), slot));
                let input = InputHandler::spawn(
                    Arc::clone(&filter),
                    Duration::from_millis(config.rescan_interval_ms),
                );
                (
                    ComponentStatus::Ready,
                    ComponentStatus::Ready,
                    Some(filter),
                    Some(worker),
                    Some(input),
                )
            }
            Err(e) => {
                warn!("Virtual output device unavailable: {}", e);
                (
                    ComponentStatus::Degraded(e.to_string()),
                    ComponentStatus::Degraded("translation unavailable".to_string()),
                    None,
                    None,
                    None,
                )
            }
        };

        // Power observation is registered regardless of the device outcome.
        let power_status = match tokio::fs::read_to_string(&config.fb_blank_path).await {
            Ok(_) => ComponentStatus::Ready,
            Err(e) => {
                warn!(
                    "Display blank attribute {} unreadable: {}; translation stays active",
                    config.fb_blank_path.display(),
                    e
                );
                ComponentStatus::Degraded(format!("{}: {}", config.fb_blank_path.display(), e))
            }
        };

        let notifier = BlankNotifier::new(state.clone());
        let watcher = FbBlankWatcher::new(
            notifier,
            config.fb_blank_path.clone(),
            Duration::from_millis(config.blank_poll_interval_ms),
        )
        .spawn();

        let report = InitReport {
            output: output_status,
            input: input_status,
            power: power_status,
            haptics: haptics_status,
        };
        info!("Home key translation service started ({})", report);

        (
            Self {
                state,
                filter,
                input,
                worker,
                watcher: Some(watcher),
            },
            report,
        )
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// The event filter, for injecting synthetic events. `None` when the
    /// translation path never came up.
    pub fn filter(&self) -> Option<&Arc<KeyEventFilter>> {
        self.filter.as_ref()
    }

    /// Stops the service in dependency order: input readers first, then the
    /// worker, then the power watcher. The worker drains any pending run
    /// before the output device is released.
    pub async fn shutdown(mut self) {
        info!("Shutting down home key translation service");

        if let Some(mut input) = self.input.take() {
            input.shutdown().await;
        }

        // The readers are gone; dropping our own filter reference closes
        // the trigger slot so the worker can drain and exit.
        drop(self.filter.take());

        if let Some(worker) = self.worker.take() {
            worker.join().await;
        }

        if let Some(mut watcher) = self.watcher.take() {
            watcher.shutdown().await;
        }

        info!("Home key translation service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_operational_only_when_every_component_is_ready() {
        let mut report = InitReport {
            output: ComponentStatus::Ready,
            input: ComponentStatus::Ready,
            power: ComponentStatus::Ready,
            haptics: ComponentStatus::Ready,
        };
        assert!(report.fully_operational());

        report.power = ComponentStatus::Degraded("no blank attribute".to_string());
        assert!(!report.fully_operational());
    }

    #[test]
    fn report_display_names_each_component() {
        let report = InitReport {
            output: ComponentStatus::Degraded("no uinput".to_string()),
            input: ComponentStatus::Degraded("translation unavailable".to_string()),
            power: ComponentStatus::Ready,
            haptics: ComponentStatus::Ready,
        };
        let rendered = report.to_string();
        assert!(rendered.contains("output: degraded: no uinput"));
        assert!(rendered.contains("power: ready"));
    }
}
