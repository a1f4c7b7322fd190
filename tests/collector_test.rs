//! Collector behavior over stub backends: disable policy, history shape,
//! fallback snapshots.

#![allow(clippy::unwrap_used)]

use mirador::backend::{AccelBackend, AccelReading};
use mirador::error::{Result, TelemetryError};
use mirador::TelemetryCollector;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counts backend calls; optionally starts failing from the Nth call.
struct StubBackend {
    calls: Arc<AtomicUsize>,
    cleanups: Arc<AtomicUsize>,
    fail_from_call: Option<usize>,
    available: bool,
}

impl StubBackend {
    fn boxed(
        calls: &Arc<AtomicUsize>,
        cleanups: &Arc<AtomicUsize>,
        fail_from_call: Option<usize>,
        available: bool,
    ) -> Box<Self> {
        Box::new(Self {
            calls: Arc::clone(calls),
            cleanups: Arc::clone(cleanups),
            fail_from_call,
            available,
        })
    }
}

impl AccelBackend for StubBackend {
    fn id(&self) -> &'static str {
        "stub"
    }

    fn gpu_name(&self) -> &str {
        "Stub GPU"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn sample(&mut self) -> Result<AccelReading> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_from_call.is_some_and(|n| call >= n) {
            return Err(TelemetryError::QueryFailed {
                backend: "stub",
                message: "synthetic failure".to_string(),
            });
        }

        Ok(AccelReading {
            platform: "Stub".to_string(),
            gpu_util_pct: call as f64,
            vram_used_gb: 2.0,
            vram_total_gb: 8.0,
            vram_pct: 25.0,
            temperature_c: Some(40.0),
            power_w: None,
        })
    }

    fn unavailable_label(&self) -> String {
        "Stub GPU (monitoring unavailable)".to_string()
    }

    fn cleanup(&mut self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

fn counters() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
}

#[test]
fn history_is_bounded_oldest_first_and_matches_latest_stats() {
    init_logging();
    let (calls, cleanups) = counters();
    let mut collector =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls, &cleanups, None, true), 5);

    for _ in 0..8 {
        let _ = collector.get_stats();
    }

    let history = collector.get_history();
    assert_eq!(history.gpu_util, vec![4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(history.vram_used.len(), 5);

    let latest = collector.get_stats();
    let history = collector.get_history();
    assert_eq!(history.gpu_util.last().copied().unwrap(), latest.gpu_util_pct);
    assert_eq!(history.cpu_util.last().copied().unwrap(), latest.cpu_util_pct);
    assert_eq!(history.ram_used.last().copied().unwrap(), latest.ram_used_gb);
}

#[test]
fn history_length_tracks_poll_count_until_capacity() {
    init_logging();
    let (calls, cleanups) = counters();
    let mut collector =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls, &cleanups, None, true), 60);

    for polls in 1..=10 {
        let _ = collector.get_stats();
        assert_eq!(collector.get_history().gpu_util.len(), polls);
    }
}

#[test]
fn query_failure_disables_backend_permanently() {
    init_logging();
    let (calls, cleanups) = counters();
    let mut collector =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls, &cleanups, Some(3), true), 60);

    assert_eq!(collector.get_stats().gpu_util_pct, 1.0);
    assert_eq!(collector.get_stats().gpu_util_pct, 2.0);

    // Third poll fails; the snapshot degrades instead of erroring.
    let degraded = collector.get_stats();
    assert_eq!(degraded.gpu_util_pct, 0.0);
    assert_eq!(degraded.vram_total_gb, 0.0);
    assert!(degraded.platform.contains("unavailable"));
    assert!(degraded.temperature_c.is_none());

    // The failing backend is never queried again.
    for _ in 0..20 {
        let snapshot = collector.get_stats();
        assert_eq!(snapshot.gpu_util_pct, 0.0);
        assert!(snapshot.platform.contains("unavailable"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn unavailable_backend_still_reports_cpu_ram_and_history() {
    init_logging();
    let (calls, cleanups) = counters();
    let mut collector =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls, &cleanups, None, false), 60);

    let snapshot = collector.get_stats();

    assert_eq!(snapshot.gpu_util_pct, 0.0);
    assert!(snapshot.platform.contains("unavailable"));
    assert_eq!(snapshot.gpu_name, "Stub GPU");
    assert!(snapshot.temperature_c.is_none());
    assert!(snapshot.power_w.is_none());
    assert!(!snapshot.cpu_model.is_empty());
    assert!(!snapshot.hostname.is_empty());
    #[cfg(target_os = "linux")]
    assert!(snapshot.ram_total_gb > 0.0);

    // Degraded snapshots keep the history continuous for the UI.
    assert_eq!(collector.get_history().gpu_util.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "unavailable backend must not be queried");
}

#[test]
fn accelerator_failure_does_not_suppress_cpu_ram_fields() {
    init_logging();
    let (calls, cleanups) = counters();
    let mut collector =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls, &cleanups, Some(1), true), 60);

    let snapshot = collector.get_stats();

    assert_eq!(snapshot.gpu_util_pct, 0.0);
    assert!(!snapshot.cpu_model.is_empty());
    #[cfg(target_os = "linux")]
    assert!(snapshot.ram_total_gb > 0.0);
}

#[test]
fn cleanup_reaches_the_backend_and_is_repeatable() {
    init_logging();
    let (calls, cleanups) = counters();
    let mut collector =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls, &cleanups, None, true), 60);

    collector.cleanup();
    collector.cleanup();

    assert_eq!(cleanups.load(Ordering::SeqCst), 2);
}

#[test]
fn collectors_do_not_share_state() {
    init_logging();
    let (calls_a, cleanups_a) = counters();
    let (calls_b, cleanups_b) = counters();
    let mut a =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls_a, &cleanups_a, None, true), 60);
    let mut b =
        TelemetryCollector::with_backend(StubBackend::boxed(&calls_b, &cleanups_b, None, true), 60);

    let _ = a.get_stats();
    let _ = a.get_stats();
    let _ = b.get_stats();

    assert_eq!(a.get_history().gpu_util.len(), 2);
    assert_eq!(b.get_history().gpu_util.len(), 1);
    assert_eq!(calls_a.load(Ordering::SeqCst), 2);
    assert_eq!(calls_b.load(Ordering::SeqCst), 1);
}
