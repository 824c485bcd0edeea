use super::error::FieldError;
use super::kind::FieldKind;
use super::vector::VectorField;
use crate::core::models::structure::{SnapshotTag, Structure};
use nalgebra::{DMatrix, Matrix3};
use std::borrow::Cow;

/// One 3×3 tensor per particle pair, symmetric as a whole.
///
/// The field is stored as a 3N×3N matrix of which only the upper triangle is
/// authoritative until [`symmetrize`](Self::symmetrize) copies it into the lower
/// triangle. Writing the block of a reversed pair `(i, j)` with `i > j` stores
/// the transposed block at `(j, i)`. Contractions always operate on the
/// symmetrized matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTensorField {
    tag: SnapshotTag,
    matrix: DMatrix<f64>,
    symmetrized: bool,
}

impl PairTensorField {
    /// The kind of this field type.
    pub const KIND: FieldKind = FieldKind::PAIR_TENSOR;

    /// Creates a zero pair tensor over `structure`.
    pub fn zeros(structure: &Structure) -> Self {
        let n = 3 * structure.len();
        Self {
            tag: structure.tag(),
            matrix: DMatrix::zeros(n, n),
            symmetrized: false,
        }
    }

    /// Wraps a 3N×3N matrix whose upper triangle holds the pair tensor.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the matrix is not 3N×3N.
    pub fn from_matrix(structure: &Structure, matrix: DMatrix<f64>) -> Result<Self, FieldError> {
        let n = 3 * structure.len();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(FieldError::SizeMismatch {
                expected: n,
                found: matrix.nrows().max(matrix.ncols()),
            });
        }
        Ok(Self {
            tag: structure.tag(),
            matrix,
            symmetrized: false,
        })
    }

    pub fn tag(&self) -> SnapshotTag {
        self.tag
    }

    /// Returns the number of particles.
    pub fn len(&self) -> usize {
        self.tag.len
    }

    pub fn is_empty(&self) -> bool {
        self.tag.len == 0
    }

    pub fn is_symmetrized(&self) -> bool {
        self.symmetrized
    }

    fn check_pair(&self, i: usize, j: usize) -> Result<(), FieldError> {
        let len = self.tag.len;
        for index in [i, j] {
            if index >= len {
                return Err(FieldError::IndexOutOfRange { index, len });
            }
        }
        Ok(())
    }

    /// Returns the 3×3 block for the pair `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Result<Matrix3<f64>, FieldError> {
        self.check_pair(i, j)?;
        if i > j {
            Ok(self.matrix.fixed_view::<3, 3>(3 * j, 3 * i).transpose())
        } else {
            Ok(self.matrix.fixed_view::<3, 3>(3 * i, 3 * j).into_owned())
        }
    }

    /// Stores the 3×3 block for the pair `(i, j)` in the upper triangle.
    pub fn set(&mut self, i: usize, j: usize, value: Matrix3<f64>) -> Result<(), FieldError> {
        self.check_pair(i, j)?;
        if i > j {
            self.matrix
                .fixed_view_mut::<3, 3>(3 * j, 3 * i)
                .copy_from(&value.transpose());
        } else {
            self.matrix
                .fixed_view_mut::<3, 3>(3 * i, 3 * j)
                .copy_from(&value);
        }
        self.symmetrized = false;
        Ok(())
    }

    fn mirrored(matrix: &DMatrix<f64>) -> DMatrix<f64> {
        let mut full = matrix.clone();
        full.fill_lower_triangle_with_upper_triangle();
        full
    }

    /// Copies the upper triangle into the lower triangle. Idempotent.
    pub fn symmetrize(&mut self) {
        if !self.symmetrized {
            self.matrix.fill_lower_triangle_with_upper_triangle();
            self.symmetrized = true;
        }
    }

    /// Returns the full symmetric 3N×3N matrix.
    pub fn to_symmetric_matrix(&self) -> DMatrix<f64> {
        if self.symmetrized {
            self.matrix.clone()
        } else {
            Self::mirrored(&self.matrix)
        }
    }

    /// Contracts the symmetric pair tensor with a vector field.
    ///
    /// The result for particle `a` is `Σ_b T_ab v_b`.
    pub fn contract(&self, vector: &VectorField) -> Result<VectorField, FieldError> {
        self.tag.ensure_compatible(&vector.tag())?;
        let full = if self.symmetrized {
            Cow::Borrowed(&self.matrix)
        } else {
            Cow::Owned(Self::mirrored(&self.matrix))
        };
        let product = full.as_ref() * vector.to_flat();
        VectorField::from_flat(self.tag, product.as_slice())
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, FieldError> {
        self.tag.ensure_compatible(&other.tag)?;
        Ok(Self {
            tag: self.tag,
            matrix: &self.matrix + &other.matrix,
            symmetrized: self.symmetrized && other.symmetrized,
        })
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, FieldError> {
        self.tag.ensure_compatible(&other.tag)?;
        Ok(Self {
            tag: self.tag,
            matrix: &self.matrix - &other.matrix,
            symmetrized: self.symmetrized && other.symmetrized,
        })
    }

    pub fn scale_by(&mut self, factor: f64) {
        self.matrix *= factor;
    }
}

impl std::ops::Mul<f64> for &PairTensorField {
    type Output = PairTensorField;

    fn mul(self, rhs: f64) -> Self::Output {
        PairTensorField {
            tag: self.tag,
            matrix: &self.matrix * rhs,
            symmetrized: self.symmetrized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use nalgebra::{Point3, Vector3};

    fn structure() -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::origin(), 1.0),
            Particle::new("B", Point3::new(1.0, 0.0, 0.0), 1.0),
        ])
    }

    fn sample_block() -> Matrix3<f64> {
        Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0)
    }

    #[test]
    fn reversed_pair_reads_back_transpose() {
        let s = structure();
        let mut t = PairTensorField::zeros(&s);
        t.set(0, 1, sample_block()).unwrap();
        assert_eq!(t.get(0, 1).unwrap(), sample_block());
        assert_eq!(t.get(1, 0).unwrap(), sample_block().transpose());
    }

    #[test]
    fn setting_reversed_pair_stores_transpose_in_upper_triangle() {
        let s = structure();
        let mut t = PairTensorField::zeros(&s);
        t.set(1, 0, sample_block()).unwrap();
        assert_eq!(t.get(0, 1).unwrap(), sample_block().transpose());
    }

    #[test]
    fn symmetrize_is_idempotent() {
        let s = structure();
        let mut t = PairTensorField::zeros(&s);
        t.set(0, 0, sample_block()).unwrap();
        t.set(0, 1, sample_block()).unwrap();
        t.symmetrize();
        let once = t.clone();
        t.symmetrize();
        assert_eq!(t, once);
        let m = t.to_symmetric_matrix();
        assert_eq!(m, m.transpose());
    }

    #[test]
    fn contraction_uses_symmetric_matrix() {
        let s = structure();
        let mut t = PairTensorField::zeros(&s);
        t.set(0, 1, Matrix3::identity()).unwrap();
        let v = VectorField::new(&s, vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)])
            .unwrap();
        let before = t.contract(&v).unwrap();
        assert_eq!(before[0], Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(before[1], Vector3::new(1.0, 0.0, 0.0));
        t.symmetrize();
        assert_eq!(t.contract(&v).unwrap(), before);
    }

    #[test]
    fn out_of_range_pair_is_rejected() {
        let s = structure();
        let t = PairTensorField::zeros(&s);
        assert_eq!(
            t.get(0, 2),
            Err(FieldError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn from_matrix_checks_dimensions() {
        let s = structure();
        assert!(matches!(
            PairTensorField::from_matrix(&s, DMatrix::zeros(3, 3)),
            Err(FieldError::SizeMismatch { expected: 6, .. })
        ));
    }
}
