//! Accelerator stats backends and backend selection.
//!
//! A backend is one concrete strategy for obtaining accelerator stats on one
//! platform. Backends are constructed infallibly: initialization failure is
//! recorded through [`AccelBackend::is_available`] rather than an error, so
//! the collector always comes up, at worst in CPU/RAM-only mode.
//!
//! Selection is a pure function over an explicit choice plus probe results,
//! so it stays testable without real hardware.

pub mod cpu_only;
pub mod jetson;

#[cfg(feature = "nvidia")]
#[cfg_attr(docsrs, doc(cfg(feature = "nvidia")))]
pub mod nvml;

pub use cpu_only::CpuOnlyBackend;
pub use jetson::{JetsonBackend, JetsonPaths};

#[cfg(feature = "nvidia")]
pub use nvml::NvmlBackend;

use crate::config::BackendChoice;
use crate::error::Result;

/// One accelerator-side reading.
///
/// CPU/RAM fields are sampled separately by the collector and never pass
/// through a backend, so an accelerator failure cannot suppress them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccelReading {
    /// Backend/platform description for this reading, e.g. "NVIDIA (NVML)".
    pub platform: String,
    /// Accelerator utilization, 0-100.
    pub gpu_util_pct: f64,
    /// Accelerator memory used, GiB.
    pub vram_used_gb: f64,
    /// Accelerator memory total, GiB.
    pub vram_total_gb: f64,
    /// Accelerator memory utilization, 0-100.
    pub vram_pct: f64,
    /// Temperature in Celsius, when the platform supplies it.
    pub temperature_c: Option<f64>,
    /// Power draw in watts, when the platform supplies it.
    pub power_w: Option<f64>,
}

/// A concrete strategy for obtaining accelerator stats on one platform.
pub trait AccelBackend: Send {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    /// Device name discovered at init, or "N/A".
    fn gpu_name(&self) -> &str;

    /// False once the backend cannot serve readings (failed init, or a
    /// tiered backend whose every tier failed).
    fn is_available(&self) -> bool;

    /// Queries the accelerator.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails; the collector reacts by
    /// permanently disabling the backend and degrading to CPU/RAM-only
    /// snapshots.
    fn sample(&mut self) -> Result<AccelReading>;

    /// Platform label for snapshots taken while unavailable.
    fn unavailable_label(&self) -> String;

    /// Releases the underlying handle. Idempotent, safe to call even if
    /// initialization never succeeded; never panics.
    fn cleanup(&mut self);
}

/// A boxed backend for dynamic dispatch.
pub type BoxedBackend = Box<dyn AccelBackend>;

/// Backend variant produced by selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Generic accelerator API (NVML).
    Nvml,
    /// Tiered Jetson sysfs backend.
    Jetson,
    /// No accelerator; CPU/RAM reporting only.
    CpuOnly,
}

/// Results of probing the host for accelerator markers.
///
/// Injected into [`select_backend`] so selection is testable with fake
/// probes.
#[derive(Debug, Clone, Default)]
pub struct BackendProbes {
    /// Jetson GPU sysfs markers are present.
    pub jetson_markers: bool,
    /// Device name reported by the generic accelerator API, if it
    /// initialized.
    pub accel_device_name: Option<String>,
}

impl BackendProbes {
    /// Probes the live host.
    #[must_use]
    pub fn detect(device_index: u32) -> Self {
        Self {
            jetson_markers: jetson::markers_present(),
            accel_device_name: Self::probe_accel_api(device_index),
        }
    }

    #[cfg(feature = "nvidia")]
    fn probe_accel_api(device_index: u32) -> Option<String> {
        nvml::probe_device_name(device_index)
    }

    #[cfg(not(feature = "nvidia"))]
    fn probe_accel_api(_device_index: u32) -> Option<String> {
        None
    }
}

/// Maps an explicit choice plus probe results to a backend variant.
///
/// An explicit choice always wins. Auto-detection prefers Jetson sysfs
/// markers, then the generic accelerator API (routing devices whose name
/// contains "Thor" to the Jetson backend, which reports more than their
/// limited NVML support does), and otherwise settles on CPU-only reporting.
#[must_use]
pub fn select_backend(choice: BackendChoice, probes: &BackendProbes) -> BackendKind {
    match choice {
        BackendChoice::Nvml => BackendKind::Nvml,
        BackendChoice::Jetson => BackendKind::Jetson,
        BackendChoice::CpuOnly => BackendKind::CpuOnly,
        BackendChoice::Auto => {
            if probes.jetson_markers {
                return BackendKind::Jetson;
            }
            match &probes.accel_device_name {
                Some(name) if name.contains("Thor") => BackendKind::Jetson,
                Some(_) => BackendKind::Nvml,
                None => BackendKind::CpuOnly,
            }
        }
    }
}
