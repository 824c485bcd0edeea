use serde::{Deserialize, Serialize};
use thiserror::Error;

const SPACING_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Sampling step must be positive and finite, got {0}")]
    InvalidStep(f64),

    #[error("Sampling bounds must be finite, got [{first}, {last})")]
    NonFiniteBound { first: f64, last: f64 },

    #[error("Sampling range is empty: last ({last}) must exceed first ({first})")]
    EmptyRange { first: f64, last: f64 },
}

/// An evenly spaced, half-open sampling interval `[first, last)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingRange {
    pub first: f64,
    pub last: f64,
    pub step: f64,
}

impl SamplingRange {
    pub fn new(first: f64, last: f64, step: f64) -> Self {
        Self { first, last, step }
    }

    /// Splits `[first, last)` into `divisions` steps of equal width.
    pub fn with_divisions(first: f64, last: f64, divisions: usize) -> Self {
        Self {
            first,
            last,
            step: (last - first) / divisions as f64,
        }
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if !self.first.is_finite() || !self.last.is_finite() {
            return Err(GridError::NonFiniteBound {
                first: self.first,
                last: self.last,
            });
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(GridError::InvalidStep(self.step));
        }
        if !(self.last > self.first) {
            return Err(GridError::EmptyRange {
                first: self.first,
                last: self.last,
            });
        }
        Ok(())
    }

    /// Returns the sampling points `first + i * step` below `last`.
    pub fn points(&self) -> Result<Vec<f64>, GridError> {
        self.validate()?;
        let count = ((self.last - self.first) / self.step - SPACING_TOLERANCE).ceil() as usize;
        Ok((0..count)
            .map(|i| self.first + i as f64 * self.step)
            .collect())
    }
}
