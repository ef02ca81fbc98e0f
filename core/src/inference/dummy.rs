//! Deterministic pure-Rust engine for host runs and tests.
//!
//! `DummyEngine` stands in for the generated classifier when no model
//! library is linked. It behaves like the generated code at the boundary:
//! it writes exactly the declared output size and raises its sink callbacks
//! through [`model_VadCallback`] with the context it was given.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::dispatch::model_VadCallback;
use super::engine::{InferenceEngine, ModelContext, Port, PortKind, TensorShape};
use crate::config::DummyConfig;

/// Echo-style engine: output `i` is input `i mod input_size` plus the
/// recurrent state, and the sink flags mean absolute input above a threshold.
#[derive(Debug)]
pub struct DummyEngine {
    config: DummyConfig,
    state: Mutex<f32>,
    predict_calls: AtomicUsize,
    reset_calls: AtomicUsize,
}

impl DummyEngine {
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            state: Mutex::new(0.0),
            predict_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Number of `predict` invocations that reached the engine.
    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }
}

impl Default for DummyEngine {
    fn default() -> Self {
        Self::new(DummyConfig::default())
    }
}

impl InferenceEngine for DummyEngine {
    fn predict(&self, context: ModelContext, input: &[f32], output: &mut [f32]) {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);

        let mean = if input.is_empty() {
            0.0
        } else {
            input.iter().sum::<f32>() / input.len() as f32
        };
        let activity = if input.is_empty() {
            0.0
        } else {
            input.iter().map(|v| v.abs()).sum::<f32>() / input.len() as f32
        };

        let offset = {
            let mut state = self.state.lock();
            let offset = *state;
            if self.config.recurrent {
                *state += mean;
            }
            offset
        };

        for (i, out) in output.iter_mut().enumerate() {
            let echoed = if input.is_empty() {
                0.0
            } else {
                input[i % input.len()]
            };
            *out = echoed + offset;
        }

        if self.config.sink_size == 0 {
            return;
        }
        let flag = (activity > self.config.activity_threshold) as i32;
        let mut values = vec![flag; self.config.sink_size];
        for _ in 0..self.config.callbacks_per_predict {
            // SAFETY: `values` holds exactly the sink size this engine reports.
            unsafe { model_VadCallback(context.as_ptr(), values.as_mut_ptr()) };
        }
    }

    fn reset(&self) {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = 0.0;
    }

    fn port_count(&self, kind: PortKind) -> usize {
        match kind {
            PortKind::Input | PortKind::Output => 1,
            PortKind::Sink => usize::from(self.config.sink_size > 0),
        }
    }

    fn size(&self, port: Port) -> usize {
        match port.kind {
            PortKind::Input => self.config.input_size,
            PortKind::Output => self.config.output_size,
            PortKind::Sink => self.config.sink_size,
        }
    }

    fn shape(&self, port: Port) -> TensorShape {
        let (declared, size) = match port.kind {
            PortKind::Input => (self.config.input_shape, self.config.input_size),
            PortKind::Output => (self.config.output_shape, self.config.output_size),
            PortKind::Sink => (self.config.sink_shape, self.config.sink_size),
        };
        declared.unwrap_or_else(|| TensorShape::vector(size))
    }

    fn metadata(&self, key: &str) -> Option<String> {
        self.config.metadata.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_echo_output() {
        let engine = DummyEngine::new(DummyConfig {
            input_size: 3,
            output_size: 5,
            sink_size: 0,
            ..Default::default()
        });
        let mut output = [0.0f32; 5];
        engine.predict(ModelContext::null(), &[1.0, 2.0, 3.0], &mut output);
        assert_eq!(output, [1.0, 2.0, 3.0, 1.0, 2.0]);
        assert_eq!(engine.predict_calls(), 1);
    }

    #[test]
    fn test_recurrent_state_cleared_by_reset() {
        let engine = DummyEngine::new(DummyConfig {
            input_size: 2,
            output_size: 2,
            recurrent: true,
            ..Default::default()
        });
        let mut output = [0.0f32; 2];
        engine.predict(ModelContext::null(), &[1.0, 3.0], &mut output);
        engine.predict(ModelContext::null(), &[1.0, 3.0], &mut output);
        assert_abs_diff_eq!(output[0], 3.0, epsilon = 1e-6);

        engine.reset();
        engine.predict(ModelContext::null(), &[1.0, 3.0], &mut output);
        assert_abs_diff_eq!(output[0], 1.0, epsilon = 1e-6);
        assert_eq!(engine.reset_calls(), 1);
    }

    #[test]
    fn test_ports_and_metadata() {
        let mut config = DummyConfig {
            sink_size: 0,
            input_shape: Some(TensorShape::new(1, 1, 80)),
            ..Default::default()
        };
        config
            .metadata
            .insert("model_name".to_string(), "keyword".to_string());
        let engine = DummyEngine::new(config);

        assert_eq!(engine.port_count(PortKind::Sink), 0);
        assert_eq!(engine.shape(Port::input(0)), TensorShape::new(1, 1, 80));
        assert_eq!(engine.shape(Port::output(0)), TensorShape::vector(31));
        assert_eq!(engine.metadata("model_name").as_deref(), Some("keyword"));
        assert_eq!(engine.metadata("missing"), None);
        assert!(!engine.is_steppable());
    }
}
