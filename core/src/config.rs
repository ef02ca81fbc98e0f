//! Configuration types for kws-harness.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::inference::TensorShape;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Model configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Dummy engine used when no generated model is linked.
    #[serde(default)]
    pub dummy: DummyConfig,

    /// Benchmark configuration.
    #[serde(default)]
    pub bench: BenchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ModelConfig {
    /// Categories file, one label per classifier output.
    #[serde(default)]
    pub categories: Option<PathBuf>,

    /// Ports declared by the generated model.
    #[serde(default)]
    pub ports: DeclaredPorts,
}

/// Port counts of the generated model. The C ABI does not report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeclaredPorts {
    #[serde(default = "default_port_count")]
    pub inputs: usize,
    #[serde(default = "default_port_count")]
    pub outputs: usize,
    #[serde(default = "default_port_count")]
    pub sinks: usize,
}

impl Default for DeclaredPorts {
    fn default() -> Self {
        Self {
            inputs: default_port_count(),
            outputs: default_port_count(),
            sinks: default_port_count(),
        }
    }
}

/// Dummy engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DummyConfig {
    pub input_size: usize,
    pub output_size: usize,
    /// Sink element count; 0 declares no sink port.
    pub sink_size: usize,
    /// Sink callbacks raised by every predict.
    pub callbacks_per_predict: usize,
    /// Carry state across predicts until reset.
    pub recurrent: bool,
    /// Mean absolute input above which the sink reports activity.
    pub activity_threshold: f32,
    pub input_shape: Option<TensorShape>,
    pub output_shape: Option<TensorShape>,
    pub sink_shape: Option<TensorShape>,
    pub metadata: BTreeMap<String, String>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            input_size: 80,
            output_size: 31,
            sink_size: 1,
            callbacks_per_predict: 1,
            recurrent: false,
            activity_threshold: 0.1,
            input_shape: None,
            output_shape: None,
            sink_shape: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Benchmark configuration.
#[derive(Debug, Deserialize)]
pub struct BenchConfig {
    /// Timed predict calls.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Untimed predict calls before measuring.
    #[serde(default = "default_warmup")]
    pub warmup: usize,

    /// Nominal core clock used to synthesize cycle counts on the host.
    #[serde(default = "default_cpu_hz")]
    pub cpu_hz: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            warmup: default_warmup(),
            cpu_hz: default_cpu_hz(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "kws_harness=trace".
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port_count() -> usize {
    1
}

fn default_iterations() -> usize {
    100
}

fn default_warmup() -> usize {
    5
}

fn default_cpu_hz() -> u64 {
    100_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::error::HarnessError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> crate::error::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject dummy shapes that disagree with their declared sizes.
    pub fn validate(&self) -> crate::error::Result<()> {
        let dummy = &self.dummy;
        let declared = [
            ("input", dummy.input_shape, dummy.input_size),
            ("output", dummy.output_shape, dummy.output_size),
            ("sink", dummy.sink_shape, dummy.sink_size),
        ];
        for (name, shape, size) in declared {
            if let Some(shape) = shape {
                if shape.numel() != size {
                    return Err(crate::error::HarnessError::config(format!(
                        "dummy {name}_shape {shape} holds {} elements, {name}_size is {size}",
                        shape.numel()
                    )));
                }
            }
        }
        Ok(())
    }
}
