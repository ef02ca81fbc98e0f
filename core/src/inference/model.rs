//! Safe wrapper around a compiled classifier.
//!
//! [`ModelWrapper`] owns the output buffer, validates port indices and input
//! sizes before they reach the engine, and registers a sink channel so the
//! engine's callbacks reach this instance's observer and no other.

use ndarray::ArrayView3;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

use super::dispatch::{SinkChannel, SinkObserver};
use super::engine::{InferenceEngine, Port, PortInfo, PortKind, TensorShape};
use super::registry::{SessionHandle, SESSIONS};
use crate::error::{HarnessError, Result};

/// Model wrapper.
///
/// The output buffer is allocated once, at construction, to the engine's
/// output 0 size and overwritten by every [`predict`](Self::predict).
///
/// # Example
///
/// ```ignore
/// use kws_harness::inference::{DummyEngine, ModelWrapper};
///
/// let mut model = ModelWrapper::new(DummyEngine::default())?;
/// model.set_observer(Box::new(|vad: &[i32]| println!("vad: {:?}", vad)));
///
/// let input = vec![0.0f32; model.input_size(0)?];
/// let scores = model.predict(&input)?;
/// println!("{} scores", scores.len());
/// ```
pub struct ModelWrapper {
    engine: Arc<dyn InferenceEngine>,
    output: Box<[f32]>,
    channel: Arc<Mutex<SinkChannel>>,
    session: SessionHandle,
}

impl ModelWrapper {
    /// Wrap an engine.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::SessionLimit`] if no callback session is free.
    pub fn new<E: InferenceEngine + 'static>(engine: E) -> Result<Self> {
        Self::from_shared(Arc::new(engine))
    }

    /// Wrap an engine the caller keeps a handle to.
    pub fn from_shared(engine: Arc<dyn InferenceEngine>) -> Result<Self> {
        let output_len = engine.size(Port::output(0));
        let channel = Arc::new(Mutex::new(SinkChannel::new(engine.clone())));
        let session = SESSIONS.register(channel.clone())?;

        debug!(
            output_len,
            session = session.index(),
            "model wrapper created"
        );

        Ok(Self {
            engine,
            output: vec![0.0; output_len].into_boxed_slice(),
            channel,
            session,
        })
    }

    /// Wrap an engine with an observer attached.
    pub fn with_observer<E, O>(engine: E, observer: O) -> Result<Self>
    where
        E: InferenceEngine + 'static,
        O: SinkObserver + 'static,
    {
        let model = Self::new(engine)?;
        model.set_observer(Box::new(observer));
        Ok(model)
    }

    /// Replace the sink observer.
    pub fn set_observer(&self, observer: Box<dyn SinkObserver>) {
        self.channel.lock().set_observer(observer);
    }

    /// Run inference.
    ///
    /// Sink callbacks the engine raises during the call reach this wrapper's
    /// observer before this returns. The returned slice is the wrapper's own
    /// output buffer and is overwritten by the next call.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::SizeMismatch`] without invoking the engine if
    /// `input` is not exactly the engine's input 0 size.
    pub fn predict(&mut self, input: &[f32]) -> Result<&[f32]> {
        let expected = self.input_size(0)?;
        if input.len() != expected {
            return Err(HarnessError::size_mismatch(expected, input.len()));
        }

        trace!(session = self.session.index(), "predict");
        let _armed = ArmedScope::new(&self.channel);
        self.engine
            .predict(self.session.to_context(), input, &mut self.output);

        Ok(&self.output[..])
    }

    /// Run inference and copy the output out.
    pub fn predict_to_vec(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.predict(input).map(|output| output.to_vec())
    }

    /// Output of the last `predict` (zeros before the first).
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    /// Last output viewed through the output 0 shape.
    pub fn output_view(&self) -> Result<ArrayView3<'_, f32>> {
        let shape = self.output_shape(0)?;
        if shape.numel() != self.output.len() {
            return Err(HarnessError::tensor(format!(
                "output shape {} does not cover {} elements",
                shape,
                self.output.len()
            )));
        }
        ArrayView3::from_shape(shape.dims(), &self.output[..])
            .map_err(|e| HarnessError::tensor(format!("Array shape error: {}", e)))
    }

    /// Values of the most recent sink callback.
    pub fn last_sink_values(&self) -> Vec<i32> {
        self.channel.lock().values().to_vec()
    }

    /// Sink callbacks delivered to this wrapper so far.
    pub fn sink_callbacks(&self) -> u64 {
        self.channel.lock().delivered()
    }

    /// Clear the engine's recurrent state. The output buffer is untouched.
    pub fn reset(&self) {
        self.engine.reset();
    }

    /// Whether the model consumes input one frame at a time.
    pub fn is_steppable(&self) -> bool {
        self.engine.is_steppable()
    }

    /// Metadata lookup.
    pub fn metadata(&self, key: &str) -> Option<String> {
        self.engine.metadata(key)
    }

    /// Live size and shape of a port.
    pub fn port(&self, port: Port) -> Result<PortInfo> {
        self.check(port)?;
        Ok(PortInfo {
            size: self.engine.size(port),
            shape: self.engine.shape(port),
        })
    }

    /// Element count of input `index`.
    pub fn input_size(&self, index: usize) -> Result<usize> {
        self.size(Port::input(index))
    }

    /// Element count of output `index`.
    pub fn output_size(&self, index: usize) -> Result<usize> {
        self.size(Port::output(index))
    }

    /// Values per callback raised by sink `index`.
    pub fn sink_output_size(&self, index: usize) -> Result<usize> {
        self.size(Port::sink(index))
    }

    /// Shape of input `index`.
    pub fn input_shape(&self, index: usize) -> Result<TensorShape> {
        self.shape(Port::input(index))
    }

    /// Shape of output `index`.
    pub fn output_shape(&self, index: usize) -> Result<TensorShape> {
        self.shape(Port::output(index))
    }

    /// Shape of sink `index`.
    pub fn sink_shape(&self, index: usize) -> Result<TensorShape> {
        self.shape(Port::sink(index))
    }

    /// Declared number of ports of a kind.
    pub fn port_count(&self, kind: PortKind) -> usize {
        self.engine.port_count(kind)
    }

    /// Session this wrapper's callbacks are routed through.
    pub fn session(&self) -> SessionHandle {
        self.session
    }

    fn size(&self, port: Port) -> Result<usize> {
        self.check(port)?;
        Ok(self.engine.size(port))
    }

    fn shape(&self, port: Port) -> Result<TensorShape> {
        self.check(port)?;
        Ok(self.engine.shape(port))
    }

    fn check(&self, port: Port) -> Result<()> {
        let count = self.engine.port_count(port.kind);
        if port.index >= count {
            return Err(HarnessError::invalid_index(port.kind, port.index, count));
        }
        Ok(())
    }
}

impl Drop for ModelWrapper {
    fn drop(&mut self) {
        SESSIONS.unregister(self.session);
        debug!(session = self.session.index(), "model wrapper dropped");
    }
}

/// Accepts sink callbacks for the duration of one `predict`.
struct ArmedScope<'a> {
    channel: &'a Mutex<SinkChannel>,
}

impl<'a> ArmedScope<'a> {
    fn new(channel: &'a Mutex<SinkChannel>) -> Self {
        channel.lock().arm();
        Self { channel }
    }
}

impl Drop for ArmedScope<'_> {
    fn drop(&mut self) {
        self.channel.lock().disarm();
    }
}
