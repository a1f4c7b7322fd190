//! Configuration for the collector and the inference coordinator.
//!
//! YAML with serde defaults; every field is optional and falls back to the
//! documented default, so an empty mapping is a valid configuration.

use crate::error::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Accelerator backend choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendChoice {
    /// Probe the host and pick the best available backend.
    #[default]
    #[serde(alias = "auto-detect")]
    Auto,
    /// Generic accelerator API (NVML).
    Nvml,
    /// Tiered Jetson sysfs backend.
    Jetson,
    /// No accelerator; CPU/RAM reporting only.
    CpuOnly,
}

/// Telemetry collector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Ring capacity for each history series (one minute at 1 Hz).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Backend override; `auto` probes the host.
    #[serde(default, alias = "backend_override")]
    pub backend: BackendChoice,

    /// Accelerator device index on multi-device hosts.
    #[serde(default)]
    pub device_index: u32,
}

fn default_history_capacity() -> usize {
    60
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            backend: BackendChoice::default(),
            device_index: 0,
        }
    }
}

/// Inference coordination settings, including the contract values the
/// external vision-language backend is driven with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Dispatch at most one inference call per this many frames.
    #[serde(default = "default_sampling_interval")]
    pub sampling_interval_frames: u64,

    /// Prompt sent with every sampled frame.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Model name forwarded to the inference backend.
    #[serde(default)]
    pub model: String,

    /// OpenAI-compatible API base URL of the inference backend.
    #[serde(default)]
    pub api_base: String,

    /// API key; local servers typically accept any value.
    #[serde(default)]
    pub api_key: String,
}

fn default_sampling_interval() -> u64 {
    30
}

fn default_prompt() -> String {
    "Describe what you see in this image in one sentence.".to_string()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sampling_interval_frames: default_sampling_interval(),
            prompt: default_prompt(),
            model: String::new(),
            api_base: String::new(),
            api_key: String::new(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Collector settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Coordinator settings.
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| TelemetryError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            TelemetryError::ConfigParse { line, message: e.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Rejects values the samplers cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.telemetry.history_capacity == 0 {
            return Err(TelemetryError::ConfigInvalid {
                key: "telemetry.history_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if self.inference.sampling_interval_frames == 0 {
            return Err(TelemetryError::ConfigInvalid {
                key: "inference.sampling_interval_frames",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
