use thiserror::Error;

use super::config::ConfigError;
use crate::core::fields::error::FieldError;
use crate::core::forcefield::ForceFieldError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ForceField(#[from] ForceFieldError),

    #[error("Diagonalization of the {weighting} matrix of dimension {dimension} did not converge")]
    Diagonalization {
        dimension: usize,
        weighting: &'static str,
    },

    #[error(
        "Eigenvalue {index} is negative ({value:e}) beyond the tolerance {tolerance:e} of a {dimension}-dimensional matrix"
    )]
    NegativeEigenvalue {
        index: usize,
        value: f64,
        tolerance: f64,
        dimension: usize,
    },

    #[error("Mode index {index} out of range for {len} modes")]
    ModeIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Particle subset is empty or has zero total weight")]
    EmptySubset,

    #[error("Friction of particle {index} must be positive and finite, got {value}")]
    InvalidFriction { index: usize, value: f64 },

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
