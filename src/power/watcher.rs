//! Polls the framebuffer blank attribute and feeds the notifier.
//!
//! There is no portable userspace push channel for fb blank transitions, so
//! the watcher samples the sysfs attribute on an interval and forwards only
//! changes. A missing or unreadable attribute degrades to "always awake"
//! instead of stopping the service.

use crate::power::BlankNotifier;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct FbBlankWatcher {
    notifier: BlankNotifier,
    blank_path: PathBuf,
    poll_interval: Duration,
}

impl FbBlankWatcher {
    pub fn new(notifier: BlankNotifier, blank_path: PathBuf, poll_interval: Duration) -> Self {
        Self {
            notifier,
            blank_path,
            poll_interval,
        }
    }

    /// Starts the poll loop in a tokio task and returns its handle.
    pub fn spawn(self) -> WatcherHandle {
        info!(
            "Starting display blank watcher on {} (poll every {:?})",
            self.blank_path.display(),
            self.poll_interval
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task_handle = tokio::spawn(self.run(shutdown_rx));

        WatcherHandle {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
        }
    }

    async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        let mut last_code: Option<i32> = None;
        let mut read_warned = false;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("Display blank watcher received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    match tokio::fs::read_to_string(&self.blank_path).await {
                        Ok(raw) => {
                            read_warned = false;
                            match parse_blank_code(&raw) {
                                Some(code) if last_code != Some(code) => {
                                    debug!("Blank attribute changed: {:?} -> {}", last_code, code);
                                    last_code = Some(code);
                                    self.notifier.notify_code(code);
                                }
                                Some(_) => {}
                                None => debug!(
                                    "Ignoring malformed blank attribute: {:?}",
                                    raw.trim()
                                ),
                            }
                        }
                        Err(e) => {
                            if !read_warned {
                                warn!(
                                    "Cannot read {}: {}; translation stays active",
                                    self.blank_path.display(),
                                    e
                                );
                                read_warned = true;
                            }
                        }
                    }
                }
            }
        }

        info!("Display blank watcher stopped");
    }
}

/// Blank attribute content is the raw code followed by a newline.
pub(crate) fn parse_blank_code(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

/// Handle for the watcher task, shut down from the service.
pub struct WatcherHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Display blank watcher already terminated");
            }
        }

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                error!("Display blank watcher task panicked: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_padded_codes() {
        assert_eq!(parse_blank_code("0\n"), Some(0));
        assert_eq!(parse_blank_code(" 4 \n"), Some(4));
        assert_eq!(parse_blank_code("-1"), Some(-1));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_blank_code(""), None);
        assert_eq!(parse_blank_code("on\n"), None);
        assert_eq!(parse_blank_code("4x"), None);
    }
}
