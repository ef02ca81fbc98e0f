//! kws-harness: runtime harness for a generated keyword-spotting classifier.
//!
//! This crate wraps a classifier compiled to native code and exposed
//! through a C-style `model_*` interface. It provides a shape-aware model
//! wrapper, routes the engine's sink callbacks back to the wrapper that
//! issued the call, and supplies the timers used to profile inference.
//!
//! # Features
//!
//! - **linked-engine**: link the generated model library and expose
//!   [`inference::LinkedEngine`]. Without it, [`inference::DummyEngine`]
//!   stands in for host runs.
//!
//! # Example
//!
//! ```ignore
//! use kws_harness::inference::{DummyEngine, ModelWrapper};
//! use kws_harness::timing::Stopwatch;
//!
//! let mut model = ModelWrapper::new(DummyEngine::default())?;
//! model.set_observer(Box::new(|vad: &[i32]| println!("vad {:?}", vad)));
//!
//! let input = vec![0.0f32; model.input_size(0)?];
//! let mut timer = Stopwatch::new();
//! timer.start();
//! let scores = model.predict(&input)?;
//! timer.stop()?;
//! println!("{} scores in {:.2}ms", scores.len(), timer.milliseconds()?);
//! ```
//!
//! # Building against a generated model
//!
//! ```bash
//! KWS_MODEL_LIB_DIR=path/to/model/lib cargo build --release --features linked-engine
//! ```

pub mod buttons;
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod input;
pub mod timing;

// Re-export commonly used types
pub use error::{HarnessError, Result};
pub use inference::{
    Categories, DummyEngine, InferenceEngine, ModelWrapper, Port, PortKind, SinkObserver,
    TensorShape,
};
pub use timing::{CycleCounter, Stopwatch};
