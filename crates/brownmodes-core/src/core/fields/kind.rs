use super::error::FieldError;
use std::fmt;

/// The shape of a particle field: what it is indexed by and what it stores.
///
/// The data rank is 1 for fields with one value per particle and 2 for fields
/// with one value per particle pair. The value rank is 0 for scalars, 1 for
/// vectors and 2 for tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKind {
    /// 1 for per-particle data, 2 for per-pair data.
    pub data_rank: u8,
    /// 0 for scalars, 1 for vectors, 2 for tensors.
    pub value_rank: u8,
}

impl FieldKind {
    pub const SCALAR: FieldKind = FieldKind {
        data_rank: 1,
        value_rank: 0,
    };
    pub const VECTOR: FieldKind = FieldKind {
        data_rank: 1,
        value_rank: 1,
    };
    pub const TENSOR: FieldKind = FieldKind {
        data_rank: 1,
        value_rank: 2,
    };
    pub const PAIR_TENSOR: FieldKind = FieldKind {
        data_rank: 2,
        value_rank: 2,
    };
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            FieldKind::SCALAR => "scalar field",
            FieldKind::VECTOR => "vector field",
            FieldKind::TENSOR => "tensor field",
            FieldKind::PAIR_TENSOR => "pair tensor field",
            _ => return write!(f, "field(data {}, value {})", self.data_rank, self.value_rank),
        };
        f.write_str(name)
    }
}

/// Binary operations between particle fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

use FieldKind as K;
use Operation::*;

/// Every allowed `(operation, lhs, rhs) -> result` combination.
///
/// Vector × Vector is the per-particle dot product. Pair tensor × Vector is
/// the contraction of the 3N×3N pair tensor with the 3N-vector.
const DISPATCH_TABLE: &[(Operation, FieldKind, FieldKind, FieldKind)] = &[
    (Add, K::SCALAR, K::SCALAR, K::SCALAR),
    (Add, K::VECTOR, K::VECTOR, K::VECTOR),
    (Add, K::TENSOR, K::TENSOR, K::TENSOR),
    (Add, K::PAIR_TENSOR, K::PAIR_TENSOR, K::PAIR_TENSOR),
    (Sub, K::SCALAR, K::SCALAR, K::SCALAR),
    (Sub, K::VECTOR, K::VECTOR, K::VECTOR),
    (Sub, K::TENSOR, K::TENSOR, K::TENSOR),
    (Sub, K::PAIR_TENSOR, K::PAIR_TENSOR, K::PAIR_TENSOR),
    (Mul, K::SCALAR, K::SCALAR, K::SCALAR),
    (Mul, K::SCALAR, K::VECTOR, K::VECTOR),
    (Mul, K::VECTOR, K::SCALAR, K::VECTOR),
    (Mul, K::VECTOR, K::VECTOR, K::SCALAR),
    (Mul, K::SCALAR, K::TENSOR, K::TENSOR),
    (Mul, K::TENSOR, K::SCALAR, K::TENSOR),
    (Mul, K::PAIR_TENSOR, K::VECTOR, K::VECTOR),
    (Div, K::SCALAR, K::SCALAR, K::SCALAR),
    (Div, K::VECTOR, K::SCALAR, K::VECTOR),
    (Div, K::TENSOR, K::SCALAR, K::TENSOR),
];

/// Looks up the result kind of `lhs op rhs`.
///
/// # Errors
///
/// Additive operations between different kinds fail with
/// [`FieldError::RankMismatch`]; any other combination missing from the table
/// fails with [`FieldError::Unsupported`].
pub fn resolve(op: Operation, lhs: FieldKind, rhs: FieldKind) -> Result<FieldKind, FieldError> {
    DISPATCH_TABLE
        .iter()
        .find(|(o, l, r, _)| *o == op && *l == lhs && *r == rhs)
        .map(|(_, _, _, result)| *result)
        .ok_or(match op {
            Add | Sub => FieldError::RankMismatch { lhs, rhs },
            Mul | Div => FieldError::Unsupported { op, lhs, rhs },
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_times_vector_is_scalar() {
        assert_eq!(resolve(Mul, K::VECTOR, K::VECTOR), Ok(K::SCALAR));
    }

    #[test]
    fn scalar_broadcasts_against_higher_ranks() {
        assert_eq!(resolve(Mul, K::SCALAR, K::TENSOR), Ok(K::TENSOR));
        assert_eq!(resolve(Div, K::VECTOR, K::SCALAR), Ok(K::VECTOR));
    }

    #[test]
    fn vector_times_tensor_is_unsupported() {
        assert_eq!(
            resolve(Mul, K::VECTOR, K::TENSOR),
            Err(FieldError::Unsupported {
                op: Mul,
                lhs: K::VECTOR,
                rhs: K::TENSOR
            })
        );
    }

    #[test]
    fn adding_different_ranks_is_a_rank_mismatch() {
        assert_eq!(
            resolve(Add, K::SCALAR, K::VECTOR),
            Err(FieldError::RankMismatch {
                lhs: K::SCALAR,
                rhs: K::VECTOR
            })
        );
    }

    #[test]
    fn division_by_vector_is_unsupported() {
        assert!(matches!(
            resolve(Div, K::SCALAR, K::VECTOR),
            Err(FieldError::Unsupported { .. })
        ));
    }

    #[test]
    fn display_names_known_kinds() {
        assert_eq!(K::PAIR_TENSOR.to_string(), "pair tensor field");
        assert_eq!(K::SCALAR.to_string(), "scalar field");
    }
}
