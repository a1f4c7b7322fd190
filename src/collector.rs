//! Hardware telemetry collector.
//!
//! Produces a [`HardwareSnapshot`] on demand while isolating accelerator
//! backend failures from the rest of the process: a poll never errors and
//! never panics, it degrades. The CPU/RAM portion is sampled independently
//! on every poll, so an accelerator failure cannot suppress it.

use crate::backend::{self, BackendKind, BackendProbes, BoxedBackend};
use crate::config::TelemetryConfig;
use crate::snapshot::{HardwareSnapshot, HistoryBuffer, HistorySnapshot};
use crate::system::{SystemReading, SystemSampler};

/// Summary re-log cadence while a backend stays unavailable, in polls.
const UNAVAILABLE_RELOG_POLLS: u64 = 60;

/// Polls hardware counters through a platform backend, maintains bounded
/// rolling history, and degrades to CPU/RAM-only reporting on backend
/// failure.
///
/// `get_stats` may perform blocking I/O (sysfs reads, SDK calls) and takes
/// `&mut self`, so overlapping polls against one collector cannot compile;
/// drive each instance from a single periodic poll loop.
pub struct TelemetryCollector {
    backend: BoxedBackend,
    system: SystemSampler,
    history: HistoryBuffer,
    /// Set on the first query failure; never cleared.
    disabled: bool,
    /// The failure has been logged once already.
    error_logged: bool,
    /// Polls served from the unavailable path, for throttled re-logging.
    unavailable_polls: u64,
}

impl TelemetryCollector {
    /// Selects a backend from configuration and host probes, then builds the
    /// collector. Never fails: at worst the backend comes up unavailable and
    /// every snapshot carries CPU/RAM data only.
    #[must_use]
    pub fn new(config: &TelemetryConfig) -> Self {
        let probes = BackendProbes::detect(config.device_index);
        let kind = backend::select_backend(config.backend, &probes);
        Self::with_backend(Self::build_backend(kind, config.device_index), config.history_capacity)
    }

    /// Builds a collector over an explicit backend. This is the seam for
    /// tests and for embedders with custom stats sources.
    #[must_use]
    pub fn with_backend(backend: BoxedBackend, history_capacity: usize) -> Self {
        Self {
            backend,
            system: SystemSampler::new(),
            history: HistoryBuffer::new(history_capacity.max(1)),
            disabled: false,
            error_logged: false,
            unavailable_polls: 0,
        }
    }

    #[cfg(feature = "nvidia")]
    fn build_backend(kind: BackendKind, device_index: u32) -> BoxedBackend {
        match kind {
            BackendKind::Nvml => Box::new(backend::NvmlBackend::new(device_index)),
            BackendKind::Jetson => Box::new(backend::JetsonBackend::new()),
            BackendKind::CpuOnly => {
                log::warn!("no accelerator detected; reporting CPU/RAM only");
                Box::new(backend::CpuOnlyBackend::new())
            }
        }
    }

    #[cfg(not(feature = "nvidia"))]
    fn build_backend(kind: BackendKind, _device_index: u32) -> BoxedBackend {
        match kind {
            BackendKind::Nvml => {
                log::warn!("built without NVML support; reporting CPU/RAM only");
                Box::new(backend::CpuOnlyBackend::new())
            }
            BackendKind::Jetson => Box::new(backend::JetsonBackend::new()),
            BackendKind::CpuOnly => {
                log::warn!("no accelerator detected; reporting CPU/RAM only");
                Box::new(backend::CpuOnlyBackend::new())
            }
        }
    }

    /// Takes one reading.
    ///
    /// Never fails. An unavailable or failing backend yields a snapshot with
    /// zeroed accelerator fields and an unavailability `platform` label; the
    /// first query failure disables the backend for the remainder of the
    /// process. Every snapshot, degraded or not, is appended to history so
    /// dashboards keep their continuity.
    pub fn get_stats(&mut self) -> HardwareSnapshot {
        let sys = self.system.sample();

        let snapshot = if self.disabled || !self.backend.is_available() {
            self.unavailable_poll(sys)
        } else {
            match self.backend.sample() {
                Ok(reading) => HardwareSnapshot {
                    platform: reading.platform,
                    gpu_name: self.backend.gpu_name().to_string(),
                    gpu_util_pct: reading.gpu_util_pct,
                    vram_used_gb: reading.vram_used_gb,
                    vram_total_gb: reading.vram_total_gb,
                    vram_pct: reading.vram_pct,
                    temperature_c: reading.temperature_c,
                    power_w: reading.power_w,
                    cpu_model: sys.cpu_model,
                    cpu_util_pct: sys.cpu_util_pct,
                    ram_used_gb: sys.ram_used_gb,
                    ram_total_gb: sys.ram_total_gb,
                    ram_pct: sys.ram_pct,
                    hostname: sys.hostname,
                },
                Err(e) => {
                    self.disabled = true;
                    if !self.error_logged {
                        log::error!("{} stats query failed: {e}", self.backend.id());
                        log::warn!(
                            "{} monitoring disabled; reporting CPU/RAM only",
                            self.backend.id()
                        );
                        self.error_logged = true;
                    }
                    self.unavailable_poll(sys)
                }
            }
        };

        self.history.record(&snapshot);
        snapshot
    }

    /// Returns owned copies of the four history series, oldest first.
    #[must_use]
    pub fn get_history(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    /// Releases the backend handle. Idempotent and safe to call even if the
    /// backend never initialized; failures are the backend's to log.
    pub fn cleanup(&mut self) {
        self.backend.cleanup();
    }

    /// Identifier of the selected backend, for diagnostics.
    #[must_use]
    pub fn backend_id(&self) -> &'static str {
        self.backend.id()
    }

    fn unavailable_poll(&mut self, sys: SystemReading) -> HardwareSnapshot {
        self.unavailable_polls += 1;
        if self.error_logged && self.unavailable_polls % UNAVAILABLE_RELOG_POLLS == 0 {
            log::warn!(
                "{} backend still unavailable ({} polls)",
                self.backend.id(),
                self.unavailable_polls
            );
        }

        HardwareSnapshot {
            platform: self.backend.unavailable_label(),
            gpu_name: self.backend.gpu_name().to_string(),
            cpu_model: sys.cpu_model,
            cpu_util_pct: sys.cpu_util_pct,
            ram_used_gb: sys.ram_used_gb,
            ram_total_gb: sys.ram_total_gb,
            ram_pct: sys.ram_pct,
            hostname: sys.hostname,
            ..HardwareSnapshot::default()
        }
    }
}

impl std::fmt::Debug for TelemetryCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryCollector")
            .field("backend", &self.backend.id())
            .field("disabled", &self.disabled)
            .field("history_len", &self.history.len())
            .finish()
    }
}
