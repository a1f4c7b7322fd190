//! CPU, RAM and host identity sampling.
//!
//! This is the always-available half of a snapshot: it is attempted on every
//! poll regardless of accelerator backend health, and never fails; any read
//! error degrades to zeroed values instead.

use crate::subprocess::run_with_timeout;
use std::time::Duration;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// CPU/RAM/host portion of a snapshot.
#[derive(Debug, Clone)]
pub struct SystemReading {
    /// CPU utilization since the previous sample, 0-100.
    pub cpu_util_pct: f64,
    /// CPU model string; "Unknown CPU" when detection fails.
    pub cpu_model: String,
    /// System RAM used, GiB.
    pub ram_used_gb: f64,
    /// System RAM total, GiB.
    pub ram_total_gb: f64,
    /// System RAM utilization, 0-100.
    pub ram_pct: f64,
    /// Host name; "unknown" when detection fails.
    pub hostname: String,
}

/// Aggregate CPU times in jiffies, from `/proc/stat`.
#[derive(Debug, Clone, Copy)]
struct CpuTimes {
    total: u64,
    idle: u64,
}

/// Samples CPU utilization, memory and host identity.
///
/// CPU utilization is a delta against the previous reading; the baseline is
/// primed at construction so the first `sample()` measures utilization since
/// then without sleeping on the poll path. Model and hostname cannot change
/// mid-process and are detected once.
#[derive(Debug)]
pub struct SystemSampler {
    prev: Option<CpuTimes>,
    cpu_model: String,
    hostname: String,
}

impl SystemSampler {
    /// Primes the CPU baseline and caches model and hostname.
    #[must_use]
    pub fn new() -> Self {
        Self { prev: read_cpu_times(), cpu_model: detect_cpu_model(), hostname: detect_hostname() }
    }

    /// Takes one reading. Never fails; unreadable sources yield zeros.
    pub fn sample(&mut self) -> SystemReading {
        let cpu_util_pct = self.cpu_delta();
        let (ram_used_gb, ram_total_gb, ram_pct) = memory_gb().unwrap_or((0.0, 0.0, 0.0));

        SystemReading {
            cpu_util_pct,
            cpu_model: self.cpu_model.clone(),
            ram_used_gb,
            ram_total_gb,
            ram_pct,
            hostname: self.hostname.clone(),
        }
    }

    fn cpu_delta(&mut self) -> f64 {
        let Some(cur) = read_cpu_times() else {
            return 0.0;
        };
        let util = match self.prev {
            Some(prev) if cur.total > prev.total => {
                let total = (cur.total - prev.total) as f64;
                let idle = cur.idle.saturating_sub(prev.idle) as f64;
                ((total - idle) / total * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        };
        self.prev = Some(cur);
        util
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads (used, total, percent) system memory in GiB.
///
/// Shared with the Jetson backend, where GPU memory is the unified system
/// RAM.
pub(crate) fn memory_gb() -> Option<(f64, f64, f64)> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo").ok().and_then(|s| parse_meminfo(&s))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn read_cpu_times() -> Option<CpuTimes> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/stat").ok().and_then(|s| parse_proc_stat(&s))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Parses the aggregate "cpu " line: user nice system idle iowait irq
/// softirq steal. Idle time counts idle + iowait.
fn parse_proc_stat(content: &str) -> Option<CpuTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> =
        line.split_whitespace().skip(1).filter_map(|v| v.parse().ok()).collect();
    if fields.len() < 4 {
        return None;
    }

    let total: u64 = fields.iter().take(8).sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes { total, idle })
}

/// Parses MemTotal/MemAvailable (kB) into (used, total, percent) GiB.
fn parse_meminfo(content: &str) -> Option<(f64, f64, f64)> {
    let mut total_kb: u64 = 0;
    let mut available_kb: u64 = 0;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("MemTotal:") => total_kb = parts.next()?.parse().ok()?,
            Some("MemAvailable:") => available_kb = parts.next()?.parse().ok()?,
            _ => {}
        }
    }
    if total_kb == 0 {
        return None;
    }

    let total = total_kb as f64 * 1024.0 / GIB;
    let used = total_kb.saturating_sub(available_kb) as f64 * 1024.0 / GIB;
    Some((used, total, used / total * 100.0))
}

/// Detects the CPU model name, "Unknown CPU" when every probe fails.
fn detect_cpu_model() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/proc/cpuinfo") {
            if let Some(model) = parse_cpuinfo_model(&content) {
                return model;
            }
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Some(out) =
            run_with_timeout("sysctl", &["-n", "machdep.cpu.brand_string"], Duration::from_secs(1))
        {
            let out = out.trim();
            if !out.is_empty() {
                return out.to_string();
            }
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Some(out) = run_with_timeout("wmic", &["cpu", "get", "name"], Duration::from_secs(1))
        {
            // First line is the "Name" column header.
            if let Some(name) = out.lines().nth(1).map(str::trim).filter(|s| !s.is_empty()) {
                return name.to_string();
            }
        }
    }

    "Unknown CPU".to_string()
}

fn parse_cpuinfo_model(content: &str) -> Option<String> {
    content
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn detect_hostname() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    if let Some(out) = run_with_timeout("hostname", &[], Duration::from_secs(1)) {
        let out = out.trim();
        if !out.is_empty() {
            return out.to_string();
        }
    }
    "unknown".to_string()
}
