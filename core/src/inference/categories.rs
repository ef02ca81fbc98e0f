//! Classifier labels.

use serde::Serialize;
use std::path::Path;

use crate::error::{HarnessError, Result};

/// One label per classifier output, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categories {
    labels: Vec<String>,
}

/// Top-scoring class of one output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub score: f32,
}

impl Categories {
    /// Parse labels, one per line. Blank lines are skipped.
    pub fn from_lines(text: &str) -> Self {
        let labels = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { labels }
    }

    /// Load a categories file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarnessError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self::from_lines(&std::fs::read_to_string(path)?))
    }

    /// Check the label count against the classifier output size.
    pub fn validate(&self, output_size: usize) -> Result<()> {
        if self.labels.len() != output_size {
            return Err(HarnessError::CategoryCount {
                found: self.labels.len(),
                expected: output_size,
            });
        }
        Ok(())
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Arg-max of `scores`. Outputs past the last label get an `#index` label.
    pub fn classify(&self, scores: &[f32]) -> Option<Prediction> {
        let (index, &score) = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_nan())
            .fold(None, |best: Option<(usize, &f32)>, (i, s)| match best {
                Some((_, b)) if *b >= *s => best,
                _ => Some((i, s)),
            })?;

        let label = self
            .label(index)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", index));
        Some(Prediction {
            index,
            label,
            score,
        })
    }
}
