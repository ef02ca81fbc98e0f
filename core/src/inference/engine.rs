//! The inference engine boundary.
//!
//! The generated classifier is opaque: the harness only sees port sizes,
//! port shapes, metadata and a `predict` entry point that may call back into
//! [`super::dispatch`] while it runs. [`InferenceEngine`] is that boundary.

use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;

/// Geometry of one port.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    /// Number of rows.
    pub rows: i32,
    /// Number of columns.
    pub columns: i32,
    /// Number of channels.
    pub channels: i32,
}

impl TensorShape {
    /// Create a shape from its three extents.
    pub fn new(rows: i32, columns: i32, channels: i32) -> Self {
        Self {
            rows,
            columns,
            channels,
        }
    }

    /// Flat shape `1 x len x 1`.
    pub fn vector(len: usize) -> Self {
        Self::new(1, len as i32, 1)
    }

    /// Number of elements described by the shape. Negative extents count as zero.
    pub fn numel(&self) -> usize {
        [self.rows, self.columns, self.channels]
            .iter()
            .map(|&d| d.max(0) as usize)
            .product()
    }

    /// Extents as `(rows, columns, channels)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            self.rows.max(0) as usize,
            self.columns.max(0) as usize,
            self.channels.max(0) as usize,
        )
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.rows, self.columns, self.channels)
    }
}

/// Kind of engine port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Input,
    Output,
    Sink,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Sink => write!(f, "sink"),
        }
    }
}

/// A port on the engine, identified by kind and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    pub kind: PortKind,
    pub index: usize,
}

impl Port {
    /// Input port `index`.
    pub fn input(index: usize) -> Self {
        Self {
            kind: PortKind::Input,
            index,
        }
    }

    /// Output port `index`.
    pub fn output(index: usize) -> Self {
        Self {
            kind: PortKind::Output,
            index,
        }
    }

    /// Sink port `index`.
    pub fn sink(index: usize) -> Self {
        Self {
            kind: PortKind::Sink,
            index,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.index)
    }
}

/// Live size and shape of a port, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub size: usize,
    pub shape: TensorShape,
}

/// Opaque identity token handed to the engine for one `predict` call.
///
/// The engine passes it back unchanged on every sink callback. It does not
/// own anything and must not be retained past the call it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelContext(*mut c_void);

impl ModelContext {
    /// The "no attached session" context.
    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Rebuild a context from the raw pointer the engine handed back.
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub(crate) fn from_bits(bits: usize) -> Self {
        Self(bits as *mut c_void)
    }

    /// Raw pointer passed to the engine.
    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    pub(crate) fn bits(&self) -> usize {
        self.0 as usize
    }

    /// True for the "no attached session" context.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// A compiled inference engine.
///
/// Size and shape queries are always live; the harness never caches them.
/// `predict` runs to completion on the calling thread and may invoke
/// [`super::dispatch::model_VadCallback`] with `context` any number of times
/// before it returns.
pub trait InferenceEngine: Send + Sync {
    /// Run one inference. `input` and `output` have exactly the sizes the
    /// engine reports for input 0 and output 0.
    fn predict(&self, context: ModelContext, input: &[f32], output: &mut [f32]);

    /// Clear any recurrent or streaming state.
    fn reset(&self);

    /// Number of declared ports of the given kind.
    fn port_count(&self, kind: PortKind) -> usize;

    /// Element count of a port. Only called with in-range indices.
    fn size(&self, port: Port) -> usize;

    /// Shape of a port. Only called with in-range indices.
    fn shape(&self, port: Port) -> TensorShape;

    /// Metadata lookup. `None` when the key is absent.
    fn metadata(&self, key: &str) -> Option<String>;

    /// Whether the engine supports incremental execution across calls.
    fn is_steppable(&self) -> bool {
        false
    }
}
