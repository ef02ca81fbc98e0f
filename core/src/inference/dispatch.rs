//! Sink callback dispatch.
//!
//! The generated engine calls one process-wide C function, `model_VadCallback`,
//! with the context it was given and a raw `int32_t` buffer. Dispatch resolves
//! the context through the session registry, copies the sink values into the
//! session's pre-sized buffer and hands them to the session's observer, all on
//! the engine's call stack before control returns to it.

use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, trace, warn};

use super::engine::{InferenceEngine, ModelContext, Port, PortKind};
use super::registry::SESSIONS;

/// Receiver for sink values raised during `predict`.
pub trait SinkObserver: Send {
    /// Called once per sink callback, synchronously, on the predicting thread.
    fn vad_callback(&mut self, values: &[i32]) {
        let _ = values;
    }
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SinkObserver for NoopObserver {}

impl<F> SinkObserver for F
where
    F: FnMut(&[i32]) + Send,
{
    fn vad_callback(&mut self, values: &[i32]) {
        self(values)
    }
}

/// Per-session callback state held by the registry.
pub struct SinkChannel {
    engine: Arc<dyn InferenceEngine>,
    buffer: Vec<i32>,
    observer: Box<dyn SinkObserver>,
    armed: bool,
    delivered: u64,
}

impl SinkChannel {
    /// Create a channel with its sink buffer sized to sink 0, if any.
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        let capacity = if engine.port_count(PortKind::Sink) > 0 {
            engine.size(Port::sink(0))
        } else {
            0
        };
        Self {
            engine,
            buffer: Vec::with_capacity(capacity),
            observer: Box::new(NoopObserver),
            armed: false,
            delivered: 0,
        }
    }

    /// Replace the observer. The previous one is dropped.
    pub fn set_observer(&mut self, observer: Box<dyn SinkObserver>) {
        self.observer = observer;
    }

    /// Values of the most recent callback.
    pub fn values(&self) -> &[i32] {
        &self.buffer
    }

    /// Callbacks delivered over the life of the session.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    /// Copy one raw callback buffer in and notify the observer.
    ///
    /// A panicking observer is contained here: the panic cannot cross the
    /// `extern "C"` frame above, so it is logged and control returns to the
    /// engine.
    ///
    /// # Safety
    ///
    /// `raw` must point to at least as many `i32`s as the engine currently
    /// reports for sink 0.
    unsafe fn deliver(&mut self, raw: *const i32) {
        if !self.armed {
            trace!("sink callback outside predict dropped");
            return;
        }
        if self.engine.port_count(PortKind::Sink) == 0 {
            trace!("sink callback from engine without sink port dropped");
            return;
        }
        let len = self.engine.size(Port::sink(0));
        let values = std::slice::from_raw_parts(raw, len);

        self.buffer.clear();
        self.buffer.extend_from_slice(values);
        self.delivered += 1;

        let Self {
            buffer, observer, ..
        } = self;
        if catch_unwind(AssertUnwindSafe(|| observer.vad_callback(buffer))).is_err() {
            error!("sink observer panicked");
        }
    }
}

/// Route one raw sink callback to the session that owns `context`.
///
/// Null or stale contexts are dropped silently.
///
/// # Safety
///
/// A non-null `output` must point to at least as many `i32`s as the engine
/// currently reports for sink 0.
pub unsafe fn dispatch_sink(context: ModelContext, output: *const i32) {
    if context.is_null() {
        trace!("sink callback without session dropped");
        return;
    }
    let Some(channel) = SESSIONS.resolve_context(context) else {
        trace!(context = context.bits(), "sink callback for unknown session dropped");
        return;
    };
    if output.is_null() {
        warn!(context = context.bits(), "sink callback with null buffer dropped");
        return;
    }
    // The registry lock is already released; only this session's channel is held.
    channel.lock().deliver(output);
}

/// Callback entry point the generated model calls for its sink node.
///
/// # Safety
///
/// Called by the engine with the context passed to `model_Predict` and a
/// buffer of the current sink size.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn model_VadCallback(context: *mut c_void, output: *mut i32) {
    dispatch_sink(ModelContext::from_ptr(context), output);
}
