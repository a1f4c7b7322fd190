//! Fallback backend for hosts with no detectable accelerator.

use super::{AccelBackend, AccelReading};
use crate::error::{Result, TelemetryError};

/// Reports no accelerator; the collector still serves CPU/RAM data around
/// it, so dashboards keep updating on accelerator-less hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuOnlyBackend;

impl CpuOnlyBackend {
    /// Creates the backend. Always "unavailable" by construction.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AccelBackend for CpuOnlyBackend {
    fn id(&self) -> &'static str {
        "cpu-only"
    }

    fn gpu_name(&self) -> &str {
        "N/A"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn sample(&mut self) -> Result<AccelReading> {
        Err(TelemetryError::BackendUnavailable("cpu-only"))
    }

    fn unavailable_label(&self) -> String {
        "no accelerator detected".to_string()
    }

    fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_available() {
        let mut backend = CpuOnlyBackend::new();

        assert!(!backend.is_available());
        assert!(backend.sample().is_err());
        assert_eq!(backend.unavailable_label(), "no accelerator detected");
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut backend = CpuOnlyBackend::new();
        backend.cleanup();
        backend.cleanup();
    }
}
