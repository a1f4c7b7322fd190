//! Snapshot and history value types shared by the collector and its readers.

use crate::ring_buffer::RingBuffer;
use serde::Serialize;

/// One immutable, fully-populated reading of accelerator/CPU/RAM state.
///
/// Every field has a defined fallback, so a snapshot is always constructible
/// even when every backend call fails. Unavailability is expressed through
/// `platform` and the optional fields, never by omitting the snapshot: zero
/// is a valid temperature or power reading and must not be confused with
/// "unknown", which is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HardwareSnapshot {
    /// Detected backend and its health, e.g. "NVIDIA (NVML)" or
    /// "no accelerator detected".
    pub platform: String,
    /// Accelerator device name; "N/A" when unknown.
    pub gpu_name: String,
    /// Accelerator utilization, 0-100.
    pub gpu_util_pct: f64,
    /// Accelerator memory used, GiB.
    pub vram_used_gb: f64,
    /// Accelerator memory total, GiB.
    pub vram_total_gb: f64,
    /// Accelerator memory utilization, 0-100.
    pub vram_pct: f64,
    /// Accelerator temperature in Celsius, when the backend supplies it.
    pub temperature_c: Option<f64>,
    /// Accelerator power draw in watts, when the backend supplies it.
    pub power_w: Option<f64>,
    /// CPU model string; "Unknown CPU" when detection fails.
    pub cpu_model: String,
    /// CPU utilization, 0-100.
    pub cpu_util_pct: f64,
    /// System RAM used, GiB.
    pub ram_used_gb: f64,
    /// System RAM total, GiB.
    pub ram_total_gb: f64,
    /// System RAM utilization, 0-100.
    pub ram_pct: f64,
    /// Host name; "unknown" when detection fails.
    pub hostname: String,
}

impl Default for HardwareSnapshot {
    /// The full-fallback snapshot: zeroed gauges, unknown optionals.
    fn default() -> Self {
        Self {
            platform: "unknown".to_string(),
            gpu_name: "N/A".to_string(),
            gpu_util_pct: 0.0,
            vram_used_gb: 0.0,
            vram_total_gb: 0.0,
            vram_pct: 0.0,
            temperature_c: None,
            power_w: None,
            cpu_model: "Unknown CPU".to_string(),
            cpu_util_pct: 0.0,
            ram_used_gb: 0.0,
            ram_total_gb: 0.0,
            ram_pct: 0.0,
            hostname: "unknown".to_string(),
        }
    }
}

/// Owned copies of the four tracked history series, oldest first.
///
/// Returned by value so callers never observe later mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySnapshot {
    /// Accelerator utilization samples, 0-100.
    pub gpu_util: Vec<f64>,
    /// Accelerator memory used samples, GiB.
    pub vram_used: Vec<f64>,
    /// CPU utilization samples, 0-100.
    pub cpu_util: Vec<f64>,
    /// System RAM used samples, GiB.
    pub ram_used: Vec<f64>,
}

/// Rolling history of the four series a live dashboard plots.
///
/// Created with the collector and living for its lifetime. Appends are O(1);
/// the oldest sample is evicted silently once a series is full.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    gpu_util: RingBuffer<f64>,
    vram_used: RingBuffer<f64>,
    cpu_util: RingBuffer<f64>,
    ram_used: RingBuffer<f64>,
}

impl HistoryBuffer {
    /// Creates empty history with the given per-series capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            gpu_util: RingBuffer::new(capacity),
            vram_used: RingBuffer::new(capacity),
            cpu_util: RingBuffer::new(capacity),
            ram_used: RingBuffer::new(capacity),
        }
    }

    /// Appends one snapshot to all four series.
    pub fn record(&mut self, snapshot: &HardwareSnapshot) {
        self.gpu_util.push(snapshot.gpu_util_pct);
        self.vram_used.push(snapshot.vram_used_gb);
        self.cpu_util.push(snapshot.cpu_util_pct);
        self.ram_used.push(snapshot.ram_used_gb);
    }

    /// Returns owned copies of all four series, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            gpu_util: self.gpu_util.to_vec(),
            vram_used: self.vram_used.to_vec(),
            cpu_util: self.cpu_util.to_vec(),
            ram_used: self.ram_used.to_vec(),
        }
    }

    /// Per-series capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.gpu_util.capacity()
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gpu_util.len()
    }

    /// Returns true if no samples were recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gpu_util.is_empty()
    }
}
