//! Input device discovery, attachment and per-device readers.
//!
//! Devices are enumerated at startup and on a rescan interval, which stands
//! in for hotplug notification: new matches get a reader, vanished devices
//! are reaped silently. Each reader is a blocking poll loop feeding the
//! shared [`KeyEventFilter`].

use crate::filter::{FilterError, KeyEventFilter};
use chrono::Local;
use evdev::Device;
use std::collections::HashMap;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Name fragment of the device class excluded from attachment.
pub const REJECTED_NAME_FRAGMENT: &str = "fpc1020";

/// Attach predicate: wildcard acceptance minus the excluded name fragment.
pub fn device_matches(name: &str) -> bool {
    !name.contains(REJECTED_NAME_FRAGMENT)
}

const READER_POLL: Duration = Duration::from_millis(5);

/// An attached input device: its reader task and the token stopping it.
struct AttachedDevice {
    name: String,
    cancel: CancellationToken,
    reader: JoinHandle<()>,
}

impl AttachedDevice {
    /// Releases the device, waiting for its reader to return. Never fails.
    async fn detach(self) {
        self.cancel.cancel();
        if let Err(e) = self.reader.await {
            error!("Reader task for '{}' panicked: {}", self.name, e);
        }
    }
}

pub struct InputHandler {
    filter: Arc<KeyEventFilter>,
    attached: HashMap<PathBuf, AttachedDevice>,
    reader_cancel: CancellationToken,
    rescan_interval: Duration,
}

impl InputHandler {
    /// Spawns the handler task: an immediate device scan followed by
    /// periodic rescans.
    pub fn spawn(filter: Arc<KeyEventFilter>, rescan_interval: Duration) -> InputHandlerHandle {
        info!("Starting input handler (rescan every {:?})", rescan_interval);

        let handler = Self {
            filter,
            attached: HashMap::new(),
            reader_cancel: CancellationToken::new(),
            rescan_interval,
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task_handle = tokio::spawn(handler.run(shutdown_rx));

        InputHandlerHandle {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
        }
    }

    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut interval = tokio::time::interval(self.rescan_interval);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("Input handler received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    self.reap_finished_readers();
                    self.scan_devices();
                }
            }
        }

        self.detach_all().await;
        info!("Input handler stopped");
    }

    /// One enumeration pass over the evdev nodes.
    fn scan_devices(&mut self) {
        for (path, device) in evdev::enumerate() {
            if self.attached.contains_key(&path) {
                continue;
            }

            let name = device.name().unwrap_or("").to_string();

            // Never attach to our own output device.
            if name == crate::output::DEVICE_NAME {
                continue;
            }

            if !device_matches(&name) {
                debug!("Skipping excluded device '{}' at {}", name, path.display());
                continue;
            }

            match self.attach(path.clone(), device, name.clone()) {
                Ok(()) => info!("Attached to input device '{}' at {}", name, path.display()),
                Err(e) => warn!(
                    "Input device '{}' at {} not available: {}",
                    name,
                    path.display(),
                    e
                ),
            }
        }
    }

    /// Claims a device and starts its reader. On failure nothing is kept.
    fn attach(&mut self, path: PathBuf, device: Device, name: String) -> Result<(), FilterError> {
        set_nonblocking(&device)?;

        let cancel = self.reader_cancel.child_token();
        let reader_cancel = cancel.clone();
        let filter = Arc::clone(&self.filter);
        let label = name.clone();

        let reader = tokio::task::spawn_blocking(move || {
            reader_loop(device, filter, reader_cancel, label);
        });

        self.attached.insert(
            path,
            AttachedDevice {
                name,
                cancel,
                reader,
            },
        );
        Ok(())
    }

    /// Drops entries whose reader already returned (device vanished).
    fn reap_finished_readers(&mut self) {
        self.attached.retain(|path, device| {
            if device.reader.is_finished() {
                debug!(
                    "Reader for '{}' at {} finished, releasing",
                    device.name,
                    path.display()
                );
                false
            } else {
                true
            }
        });
    }

    async fn detach_all(&mut self) {
        self.reader_cancel.cancel();
        for (_, device) in self.attached.drain() {
            device.detach().await;
        }
    }
}

/// Blocking poll loop for one device. Exits on cancellation or when the
/// device goes away.
fn reader_loop(
    mut device: Device,
    filter: Arc<KeyEventFilter>,
    cancel: CancellationToken,
    name: String,
) {
    debug!("Reader started for '{}'", name);

    // Throughput accounting, reported periodically.
    let mut seen: u64 = 0;
    let mut consumed: u64 = 0;
    let mut last_log_time = Local::now();
    let log_interval = chrono::Duration::seconds(30);

    while !cancel.is_cancelled() {
        match device.fetch_events() {
            Ok(events) => {
                for event in events {
                    seen += 1;
                    if filter.filter_event(&event) {
                        consumed += 1;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(READER_POLL);
            }
            Err(e) if e.raw_os_error() == Some(libc::ENODEV) => {
                // Unplugged; the rescan pass reaps this reader.
                debug!("Input device '{}' vanished", name);
                break;
            }
            Err(e) => {
                warn!("Reader for '{}' failed: {}", name, e);
                break;
            }
        }

        let now = Local::now();
        if now - last_log_time > log_interval {
            debug!(
                "Reader '{}' stats: {} events seen, {} consumed in last {} seconds",
                name,
                seen,
                consumed,
                log_interval.num_seconds()
            );
            seen = 0;
            consumed = 0;
            last_log_time = now;
        }
    }

    debug!("Reader stopped for '{}'", name);
}

/// Switches the device fd to non-blocking reads, preserving other flags.
fn set_nonblocking(device: &Device) -> Result<(), FilterError> {
    let raw_fd = device.as_raw_fd();

    let current = unsafe { libc::fcntl(raw_fd, libc::F_GETFL) };
    if current < 0 {
        return Err(FilterError::DeviceUnavailable(format!(
            "fcntl(F_GETFL): {}",
            io::Error::last_os_error()
        )));
    }

    let rc = unsafe { libc::fcntl(raw_fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(FilterError::DeviceUnavailable(format!(
            "fcntl(F_SETFL, O_NONBLOCK): {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

/// Handle for the input handler task.
pub struct InputHandlerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<JoinHandle<()>>,
}

impl InputHandlerHandle {
    /// Stops rescanning and detaches every reader before returning.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Input handler already terminated");
            }
        }

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                error!("Input handler task panicked: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_sensor_names_are_rejected() {
        assert!(!device_matches("fpc1020_fingerprint"));
        assert!(!device_matches("fpc1020"));
        assert!(!device_matches("touch_fpc1020_sensor"));
    }

    #[test]
    fn all_other_names_are_accepted() {
        assert!(device_matches("qwerty_keyboard"));
        assert!(device_matches("gpio-keys"));
        assert!(device_matches(""));
    }
}
