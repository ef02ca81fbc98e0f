//! Model inference module.
//!
//! This module wraps the generated classifier behind [`InferenceEngine`],
//! routes its sink callbacks back to the owning [`ModelWrapper`], and maps
//! scores to labels.

mod categories;
mod dispatch;
mod dummy;
mod engine;
#[cfg(feature = "linked-engine")]
mod ffi;
#[cfg(feature = "linked-engine")]
mod linked;
mod model;
mod registry;

pub use categories::{Categories, Prediction};
pub use dispatch::{dispatch_sink, model_VadCallback, NoopObserver, SinkChannel, SinkObserver};
pub use dummy::DummyEngine;
pub use engine::{InferenceEngine, ModelContext, Port, PortInfo, PortKind, TensorShape};
#[cfg(feature = "linked-engine")]
pub use linked::LinkedEngine;
pub use model::ModelWrapper;
pub use registry::{SessionHandle, SessionRegistry, MAX_SESSIONS};
