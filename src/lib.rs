//! mirador: live hardware telemetry and inference-state coordination for
//! interactive vision workloads.
//!
//! Two independent sampling loops feed a push layer owned by the caller:
//!
//! - [`TelemetryCollector`] polls accelerator/CPU/RAM counters through a
//!   platform backend selected at startup (or probed at runtime), keeps a
//!   bounded rolling history, and degrades to CPU/RAM-only reporting when a
//!   backend fails. A poll never errors and never panics.
//! - [`InferenceCoordinator`] receives decoded video frames at their native
//!   rate, forwards every Kth frame to a vision-language backend with at
//!   most one call in flight, and always serves the most recent completed
//!   text without blocking the frame path.
//!
//! The media transport, the push channel, the HTTP surface and the concrete
//! inference backend live outside this crate; they talk to it through
//! [`HardwareSnapshot`], [`HistorySnapshot`], [`InferenceResponse`] and the
//! [`InferenceBackend`] trait.
//!
//! # Feature Flags
//!
//! - `nvidia` (default): NVIDIA accelerator stats via NVML. The library is
//!   resolved at runtime, so this builds on any host.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mirador::{Config, TelemetryCollector};
//!
//! let config = Config::load_or_default("mirador.yaml");
//! let mut collector = TelemetryCollector::new(&config.telemetry);
//!
//! // 1 Hz poll loop, one per collector instance.
//! let snapshot = collector.get_stats();
//! println!("{}: {:.0}% gpu, {:.0}% cpu",
//!     snapshot.platform, snapshot.gpu_util_pct, snapshot.cpu_util_pct);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

// ============================================================================
// Error Types
// ============================================================================

pub mod error;
pub use error::{Result, TelemetryError};

// ============================================================================
// Core Types
// ============================================================================

pub mod ring_buffer;
pub mod snapshot;
pub mod subprocess;

pub use ring_buffer::RingBuffer;
pub use snapshot::{HardwareSnapshot, HistoryBuffer, HistorySnapshot};

// ============================================================================
// Configuration
// ============================================================================

pub mod config;
pub use config::{BackendChoice, Config, InferenceConfig, TelemetryConfig};

// ============================================================================
// Sampling
// ============================================================================

pub mod backend;
pub mod system;

pub mod collector;
pub use collector::TelemetryCollector;

// ============================================================================
// Inference Coordination
// ============================================================================

pub mod coordinator;
pub use coordinator::{
    Frame, InferFuture, InferenceBackend, InferenceCoordinator, InferenceResponse,
};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types.
pub mod prelude {
    pub use super::backend::{AccelBackend, AccelReading, BackendKind, BackendProbes};
    pub use super::config::{BackendChoice, Config, InferenceConfig, TelemetryConfig};
    pub use super::coordinator::{
        Frame, InferenceBackend, InferenceCoordinator, InferenceResponse,
    };
    pub use super::error::{Result, TelemetryError};
    pub use super::ring_buffer::RingBuffer;
    pub use super::snapshot::{HardwareSnapshot, HistoryBuffer, HistorySnapshot};
    pub use super::TelemetryCollector;
}
