use super::kind::{FieldKind, Operation};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("Fields are defined for different structures")]
    IncompatibleUniverse,

    #[error("Structure version numbers do not agree (expected {expected}, found {found})")]
    StaleVersion { expected: u64, found: u64 },

    #[error("Ranks do not match: {lhs} and {rhs}")]
    RankMismatch { lhs: FieldKind, rhs: FieldKind },

    #[error("Data incompatible with structure: expected {expected} values, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("Operation {op:?} is not supported between {lhs} and {rhs}")]
    Unsupported {
        op: Operation,
        lhs: FieldKind,
        rhs: FieldKind,
    },

    #[error("Cannot rescale a field with zero norm")]
    ZeroNorm,

    #[error("Particle index {index} out of range for {len} particles")]
    IndexOutOfRange { index: usize, len: usize },
}
