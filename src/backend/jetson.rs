//! Jetson accelerator backend over sysfs.
//!
//! Two tiers. The full tier reads devfreq GPU load, unified memory, a GPU
//! thermal zone and a power rail. The counter tier reads only the raw
//! `nvhost_podgov` GPC/NVD load counters (utilization, nothing else). A full
//! tier read failure falls back to the counters for that call only, with a
//! one-time informational note; the backend errors (and the collector then
//! disables it) only when both tiers fail on the same call.

use super::{AccelBackend, AccelReading};
use crate::error::{Result, TelemetryError};
use crate::system;
use std::path::{Path, PathBuf};

/// Sysfs base for the Thor-generation GPU (JetPack 7 / L4T r38.2).
const GPU_BASE: &str =
    "/sys/devices/platform/bus@0/d0b0000000.pcie/pci0000:00/0000:00:00.0/0000:01:00.0";

/// Sysfs nodes consumed by the two tiers.
#[derive(Debug, Clone)]
pub struct JetsonPaths {
    /// Full tier: devfreq GPU load, 0-1000 scale.
    pub load: PathBuf,
    /// Full tier: GPU thermal zone, millidegrees Celsius. Best-effort.
    pub temperature: PathBuf,
    /// Full tier: total power rail, milliwatts. Best-effort.
    pub power: PathBuf,
    /// Counter tier: GPC engine load target.
    pub gpc_load_target: PathBuf,
    /// Counter tier: GPC engine load max.
    pub gpc_load_max: PathBuf,
    /// Counter tier: NVD engine load target. Best-effort.
    pub nvd_load_target: PathBuf,
    /// Counter tier: NVD engine load max. Best-effort.
    pub nvd_load_max: PathBuf,
}

impl Default for JetsonPaths {
    fn default() -> Self {
        let base = Path::new(GPU_BASE);
        Self {
            load: PathBuf::from("/sys/devices/platform/gpu.0/load"),
            temperature: PathBuf::from("/sys/class/thermal/thermal_zone1/temp"),
            power: PathBuf::from("/sys/class/hwmon/hwmon1/power1_input"),
            gpc_load_target: base.join("gpu-gpc-0/devfreq/gpu-gpc-0/nvhost_podgov/load_target"),
            gpc_load_max: base.join("gpu-gpc-0/devfreq/gpu-gpc-0/nvhost_podgov/load_max"),
            nvd_load_target: base.join("gpu-nvd-0/devfreq/gpu-nvd-0/nvhost_podgov/load_target"),
            nvd_load_max: base.join("gpu-nvd-0/devfreq/gpu-nvd-0/nvhost_podgov/load_max"),
        }
    }
}

impl JetsonPaths {
    /// Places every node directly under one directory. Used by tests and by
    /// containers that bind-mount a flattened sysfs subset.
    #[must_use]
    pub fn under_root(root: &Path) -> Self {
        Self {
            load: root.join("load"),
            temperature: root.join("temp"),
            power: root.join("power"),
            gpc_load_target: root.join("gpc_load_target"),
            gpc_load_max: root.join("gpc_load_max"),
            nvd_load_target: root.join("nvd_load_target"),
            nvd_load_max: root.join("nvd_load_max"),
        }
    }
}

/// True when Jetson GPU sysfs markers exist on this host.
#[must_use]
pub fn markers_present() -> bool {
    let paths = JetsonPaths::default();
    paths.load.is_file() || paths.gpc_load_target.is_file()
}

/// Which tier serves reads first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Full,
    Counters,
}

/// Tiered Jetson backend.
#[derive(Debug)]
pub struct JetsonBackend {
    paths: JetsonPaths,
    available: bool,
    tier: Tier,
    fallback_noted: bool,
}

impl JetsonBackend {
    /// Builds the backend over the default sysfs locations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_paths(JetsonPaths::default())
    }

    /// Builds the backend over explicit sysfs nodes.
    ///
    /// The tier is picked by what is accessible at construction: the full
    /// load node, then the raw counters, else the backend comes up
    /// unavailable.
    #[must_use]
    pub fn with_paths(paths: JetsonPaths) -> Self {
        let (available, tier) = if paths.load.is_file() {
            log::info!("Jetson monitoring initialized (full sysfs telemetry)");
            (true, Tier::Full)
        } else if paths.gpc_load_target.is_file() {
            log::info!("Jetson monitoring initialized (nvhost_podgov counters, limited stats)");
            (true, Tier::Counters)
        } else {
            log::warn!("Jetson GPU sysfs nodes not accessible");
            (false, Tier::Counters)
        };

        Self { paths, available, tier, fallback_noted: false }
    }

    /// Full tier: load, unified memory, best-effort temperature and power.
    fn sample_full(&self) -> Result<AccelReading> {
        let load = read_u64(&self.paths.load)?;
        let gpu_util_pct = (load as f64 / 10.0).clamp(0.0, 100.0);

        // The GPU shares system RAM on Jetson; report unified memory as VRAM.
        let (vram_used_gb, vram_total_gb, vram_pct) =
            system::memory_gb().unwrap_or((0.0, 0.0, 0.0));

        let temperature_c = read_u64(&self.paths.temperature).ok().map(|m| m as f64 / 1000.0);
        let power_w = read_u64(&self.paths.power).ok().map(|mw| mw as f64 / 1000.0);

        Ok(AccelReading {
            platform: "Jetson (sysfs telemetry)".to_string(),
            gpu_util_pct,
            vram_used_gb,
            vram_total_gb,
            vram_pct,
            temperature_c,
            power_w,
        })
    }

    /// Counter tier: GPC plus best-effort NVD load; overall utilization is
    /// the busier engine. No memory, temperature or power this way.
    fn sample_counters(&self) -> Result<AccelReading> {
        let gpc_target = read_u64(&self.paths.gpc_load_target)?;
        let gpc_max = read_u64(&self.paths.gpc_load_max)?;
        let mut gpu_util_pct = ratio_pct(gpc_target, gpc_max);

        if let (Ok(nvd_target), Ok(nvd_max)) =
            (read_u64(&self.paths.nvd_load_target), read_u64(&self.paths.nvd_load_max))
        {
            gpu_util_pct = gpu_util_pct.max(ratio_pct(nvd_target, nvd_max));
        }

        Ok(AccelReading {
            platform: "Jetson (nvhost_podgov)".to_string(),
            gpu_util_pct,
            ..AccelReading::default()
        })
    }
}

impl Default for JetsonBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelBackend for JetsonBackend {
    fn id(&self) -> &'static str {
        "jetson"
    }

    fn gpu_name(&self) -> &str {
        "NVIDIA Jetson"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn sample(&mut self) -> Result<AccelReading> {
        if !self.available {
            return Err(TelemetryError::BackendUnavailable("jetson"));
        }

        if self.tier == Tier::Full {
            match self.sample_full() {
                Ok(reading) => return Ok(reading),
                Err(e) => {
                    // This call degrades to the counters; the full tier is
                    // retried on the next poll.
                    if !self.fallback_noted {
                        log::info!("Jetson full telemetry read failed ({e}); using nvhost_podgov counters");
                        self.fallback_noted = true;
                    }
                }
            }
        }

        match self.sample_counters() {
            Ok(reading) => Ok(reading),
            Err(e) => {
                self.available = false;
                Err(e)
            }
        }
    }

    fn unavailable_label(&self) -> String {
        "Jetson (monitoring unavailable)".to_string()
    }

    fn cleanup(&mut self) {
        self.available = false;
    }
}

fn ratio_pct(value: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        (value as f64 / max as f64 * 100.0).clamp(0.0, 100.0)
    }
}

fn read_u64(path: &Path) -> Result<u64> {
    let text = std::fs::read_to_string(path).map_err(|e| TelemetryError::QueryFailed {
        backend: "jetson",
        message: format!("{}: {e}", path.display()),
    })?;
    text.trim().parse().map_err(|e| TelemetryError::QueryFailed {
        backend: "jetson",
        message: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_pct_handles_zero_max() {
        assert_eq!(ratio_pct(500, 0), 0.0);
        assert_eq!(ratio_pct(250, 1000), 25.0);
        assert_eq!(ratio_pct(2000, 1000), 100.0);
    }

    #[test]
    fn test_unavailable_without_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = JetsonBackend::with_paths(JetsonPaths::under_root(dir.path()));

        assert!(!backend.is_available());
        assert!(matches!(backend.sample(), Err(TelemetryError::BackendUnavailable(_))));
    }

    #[test]
    fn test_unavailable_label_mentions_unavailability() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JetsonBackend::with_paths(JetsonPaths::under_root(dir.path()));

        assert!(backend.unavailable_label().contains("unavailable"));
    }

    #[test]
    fn test_read_u64_rejects_non_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("load");
        std::fs::write(&path, "not a number\n").unwrap();

        assert!(read_u64(&path).is_err());
    }
}
