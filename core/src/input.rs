//! Input frames for the command line.
//!
//! A frame is a JSON document `{ "data": [f32, ...] }` holding one input
//! tensor in row-major order.

use serde::Deserialize;
use std::path::Path;

use crate::error::{HarnessError, Result};

/// One input tensor read from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputFrame {
    pub data: Vec<f32>,
}

impl InputFrame {
    /// Parse a frame from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let frame: InputFrame = serde_json::from_str(json)?;
        Ok(frame)
    }

    /// Load a frame from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarnessError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
