//! Haptic feedback on key-down.

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HapticsError {
    #[error("Vibrator not available: {0}")]
    NotAvailable(String),

    #[error("Failed to drive vibrator: {0}")]
    PulseError(String),
}

/// Fire-and-forget vibration pulse. The worker never waits on completion
/// and treats pulse failures as log-only.
pub trait Vibrator: Send + 'static {
    fn pulse(&mut self, strength: u32) -> Result<(), HapticsError>;

    /// Availability check for the startup report. The default assumes the
    /// actuator is present.
    fn probe(&self) -> Result<(), HapticsError> {
        Ok(())
    }
}

/// Drives a timed-output vibrator through its sysfs enable attribute.
pub struct SysfsVibrator {
    enable_path: PathBuf,
}

impl SysfsVibrator {
    pub fn new(enable_path: impl Into<PathBuf>) -> Self {
        Self {
            enable_path: enable_path.into(),
        }
    }
}

impl Vibrator for SysfsVibrator {
    fn pulse(&mut self, strength: u32) -> Result<(), HapticsError> {
        debug!("Vibration pulse with strength {}", strength);
        std::fs::write(&self.enable_path, strength.to_string()).map_err(|e| {
            HapticsError::PulseError(format!("{}: {}", self.enable_path.display(), e))
        })
    }

    fn probe(&self) -> Result<(), HapticsError> {
        if self.enable_path.exists() {
            Ok(())
        } else {
            Err(HapticsError::NotAvailable(format!(
                "{} does not exist",
                self.enable_path.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_writes_the_strength_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enable");
        std::fs::write(&path, "0").unwrap();

        let mut vibrator = SysfsVibrator::new(&path);
        vibrator.pulse(20).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "20");
    }

    #[test]
    fn pulse_against_missing_node_reports_the_path() {
        let mut vibrator = SysfsVibrator::new("/nonexistent/vibrator/enable");
        let err = vibrator.pulse(20).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vibrator/enable"));
    }

    #[test]
    fn probe_reflects_node_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enable");

        let vibrator = SysfsVibrator::new(&path);
        assert!(vibrator.probe().is_err());

        std::fs::write(&path, "0").unwrap();
        assert!(vibrator.probe().is_ok());
    }
}
