//! [`InferenceEngine`] over the linked C ABI of the generated model.

use std::ffi::{CStr, CString};

use super::engine::{InferenceEngine, ModelContext, Port, PortKind, TensorShape};
use super::ffi;
use crate::config::DeclaredPorts;

/// The generated model linked into this binary.
///
/// The C ABI is process-wide, so every `LinkedEngine` drives the same
/// engine state. Port counts are not exposed by the ABI and come from the
/// declared ports in configuration.
#[derive(Debug, Clone)]
pub struct LinkedEngine {
    ports: DeclaredPorts,
}

impl LinkedEngine {
    pub fn new(ports: DeclaredPorts) -> Self {
        Self { ports }
    }

    /// Number of nodes in the compiled graph.
    pub fn num_nodes(&self) -> usize {
        unsafe { ffi::model_GetNumNodes() }.max(0) as usize
    }
}

impl Default for LinkedEngine {
    fn default() -> Self {
        Self::new(DeclaredPorts::default())
    }
}

impl InferenceEngine for LinkedEngine {
    fn predict(&self, context: ModelContext, input: &[f32], output: &mut [f32]) {
        // SAFETY: the caller sized both buffers from the engine's own size
        // queries. The generated code reads `input` without writing to it.
        unsafe {
            ffi::model_Predict(
                context.as_ptr(),
                input.as_ptr() as *mut f32,
                output.as_mut_ptr(),
            )
        }
    }

    fn reset(&self) {
        unsafe { ffi::model_Reset() }
    }

    fn port_count(&self, kind: PortKind) -> usize {
        match kind {
            PortKind::Input => self.ports.inputs,
            PortKind::Output => self.ports.outputs,
            PortKind::Sink => self.ports.sinks,
        }
    }

    fn size(&self, port: Port) -> usize {
        let index = port.index as i32;
        let size = unsafe {
            match port.kind {
                PortKind::Input => ffi::model_GetInputSize(index),
                PortKind::Output => ffi::model_GetOutputSize(index),
                PortKind::Sink => ffi::model_GetSinkOutputSize(index),
            }
        };
        size.max(0) as usize
    }

    fn shape(&self, port: Port) -> TensorShape {
        let index = port.index as i32;
        let mut shape = TensorShape::default();
        unsafe {
            match port.kind {
                PortKind::Input => ffi::model_GetInputShape(index, &mut shape),
                PortKind::Output => ffi::model_GetOutputShape(index, &mut shape),
                PortKind::Sink => ffi::model_GetSinkOutputShape(index, &mut shape),
            }
        }
        shape
    }

    fn metadata(&self, key: &str) -> Option<String> {
        let key = CString::new(key).ok()?;
        let value = unsafe { ffi::model_GetMetadata(key.as_ptr() as *mut _) };
        if value.is_null() {
            None
        } else {
            // SAFETY: non-null metadata values are NUL-terminated strings
            // owned by the generated code for the life of the process.
            Some(unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned())
        }
    }
}
