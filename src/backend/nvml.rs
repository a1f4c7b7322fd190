//! NVIDIA accelerator backend via NVML.
//!
//! Uses the nvml-wrapper crate; covers desktop GPUs, DGX systems and the
//! Jetson models with working NVML support. NVML is resolved at runtime, so
//! the crate builds and runs (unavailable) on hosts without the driver.

use super::{AccelBackend, AccelReading};
use crate::error::{Result, TelemetryError};
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Nvml;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Backend for NVIDIA devices through the NVML library.
///
/// Initialization failure is non-fatal: the backend is constructed
/// unavailable and the collector reports CPU/RAM only.
#[derive(Debug)]
pub struct NvmlBackend {
    nvml: Option<Nvml>,
    device_index: u32,
    device_name: String,
}

impl NvmlBackend {
    /// Initializes NVML and resolves the device name.
    #[must_use]
    pub fn new(device_index: u32) -> Self {
        let nvml = match Nvml::init() {
            Ok(nvml) => Some(nvml),
            Err(e) => {
                log::warn!("NVML not available: {e}");
                None
            }
        };

        let device_name = nvml
            .as_ref()
            .and_then(|n| n.device_by_index(device_index).and_then(|d| d.name()).ok());

        let nvml = match (&device_name, nvml) {
            (Some(name), Some(nvml)) => {
                log::info!("NVML initialized for GPU: {name}");
                Some(nvml)
            }
            (None, Some(_)) => {
                log::warn!("NVML device {device_index} not accessible");
                None
            }
            (_, None) => None,
        };

        Self {
            nvml,
            device_index,
            device_name: device_name.unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

impl AccelBackend for NvmlBackend {
    fn id(&self) -> &'static str {
        "nvml"
    }

    fn gpu_name(&self) -> &str {
        &self.device_name
    }

    fn is_available(&self) -> bool {
        self.nvml.is_some()
    }

    fn sample(&mut self) -> Result<AccelReading> {
        let nvml = self.nvml.as_ref().ok_or(TelemetryError::BackendUnavailable("nvml"))?;

        let device =
            nvml.device_by_index(self.device_index).map_err(|e| TelemetryError::QueryFailed {
                backend: "nvml",
                message: format!("device {}: {e}", self.device_index),
            })?;

        let utilization = device.utilization_rates().map_err(|e| TelemetryError::QueryFailed {
            backend: "nvml",
            message: format!("utilization: {e}"),
        })?;

        let memory = device.memory_info().map_err(|e| TelemetryError::QueryFailed {
            backend: "nvml",
            message: format!("memory info: {e}"),
        })?;

        // Temperature and power are optional on some boards; absence is not
        // a query failure.
        let temperature_c = device.temperature(TemperatureSensor::Gpu).ok().map(f64::from);
        let power_w = device.power_usage().ok().map(|mw| f64::from(mw) / 1000.0);

        let vram_pct = if memory.total > 0 {
            memory.used as f64 / memory.total as f64 * 100.0
        } else {
            0.0
        };

        Ok(AccelReading {
            platform: "NVIDIA (NVML)".to_string(),
            gpu_util_pct: f64::from(utilization.gpu),
            vram_used_gb: memory.used as f64 / GIB,
            vram_total_gb: memory.total as f64 / GIB,
            vram_pct,
            temperature_c,
            power_w,
        })
    }

    fn unavailable_label(&self) -> String {
        if self.device_name == "N/A" {
            "NVIDIA (NVML unavailable)".to_string()
        } else {
            format!("NVIDIA {} (monitoring unavailable)", self.device_name)
        }
    }

    fn cleanup(&mut self) {
        if let Some(nvml) = self.nvml.take() {
            drop(nvml);
            log::info!("NVML shutdown complete");
        }
    }
}

/// Probes the device name without keeping a handle, for auto-detection.
pub(crate) fn probe_device_name(device_index: u32) -> Option<String> {
    let nvml = Nvml::init().ok()?;
    nvml.device_by_index(device_index).and_then(|d| d.name()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_never_panics() {
        // With or without a GPU present, construction must succeed.
        let backend = NvmlBackend::new(0);
        let _ = backend.is_available();
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut backend = NvmlBackend::new(0);

        backend.cleanup();
        backend.cleanup();

        assert!(!backend.is_available());
        assert!(matches!(backend.sample(), Err(TelemetryError::BackendUnavailable(_))));
    }

    #[test]
    fn test_unavailable_label_shapes() {
        let mut backend = NvmlBackend::new(0);
        backend.cleanup();

        let label = backend.unavailable_label();
        assert!(label.contains("NVIDIA"));
        assert!(label.contains("unavailable"));
    }

    #[test]
    fn test_bogus_device_index_is_unavailable() {
        // Device 4095 does not exist even on dense multi-GPU hosts.
        let backend = NvmlBackend::new(4095);
        assert!(!backend.is_available());
    }
}
