use super::config::Subspace;
use super::error::EngineError;
use super::friction::FrictionField;
use crate::core::fields::vector::VectorField;
use crate::core::models::structure::Structure;
use nalgebra::{DMatrix, DVector, SVD, Vector3};
use tracing::debug;

/// Singular values below this fraction of the input scale are treated as zero.
const RELATIVE_SINGULAR_VALUE_CUTOFF: f64 = 1e-10;

/// An orthonormal basis in friction-weighted coordinates.
///
/// `weighted` holds the orthonormal columns `P` (3N×m); `unweighted` holds
/// `Q = diag(1/√γ) P`, the same directions in plain Cartesian coordinates.
#[derive(Debug, Clone)]
pub(crate) struct WeightedBasis {
    pub weighted: DMatrix<f64>,
    pub unweighted: DMatrix<f64>,
}

impl WeightedBasis {
    pub fn dimension(&self) -> usize {
        self.weighted.ncols()
    }
}

/// Returns the six rigid-body motions of `structure`.
///
/// The first three vectors are unit translations along x, y and z; the last
/// three are infinitesimal rotations about the same axes through the centre of
/// mass. The vectors are neither normalized nor orthogonal, and rotations
/// vanish for structures with fewer than two particles.
pub fn rigid_body_motions(structure: &Structure) -> Vec<VectorField> {
    let center = structure.center_of_mass();
    let offsets: Vec<Vector3<f64>> = structure
        .positions()
        .iter()
        .map(|p| p - center)
        .collect();
    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];

    let translations = axes
        .iter()
        .map(|axis| VectorField::from_values(structure.tag(), vec![*axis; structure.len()]));
    let rotations = axes.iter().map(|axis| {
        VectorField::from_values(
            structure.tag(),
            offsets.iter().map(|r| axis.cross(r)).collect(),
        )
    });
    translations.chain(rotations).collect()
}

fn weighted_columns(
    vectors: &[VectorField],
    structure: &Structure,
    sqrt_friction: &DVector<f64>,
) -> Result<DMatrix<f64>, EngineError> {
    let mut matrix = DMatrix::zeros(3 * structure.len(), vectors.len());
    for (j, vector) in vectors.iter().enumerate() {
        structure.tag().ensure_compatible(&vector.tag())?;
        let column = vector.to_flat().component_mul(sqrt_friction);
        matrix.set_column(j, &column);
    }
    Ok(matrix)
}

/// Returns an orthonormal basis of the column space of `matrix`.
///
/// Directions whose singular value is small compared to `scale` are dropped.
/// `scale` is the Frobenius norm of the vectors before any projection, so that
/// round-off left over from projecting out a direction is not mistaken for
/// a genuine direction.
fn orthonormalize(matrix: DMatrix<f64>, scale: f64) -> Result<DMatrix<f64>, EngineError> {
    let rows = matrix.nrows();
    if matrix.ncols() == 0 || scale <= 0.0 {
        return Ok(DMatrix::zeros(rows, 0));
    }
    let svd = SVD::new(matrix, true, false);
    let u = svd
        .u
        .ok_or_else(|| EngineError::Internal("SVD did not produce left singular vectors".into()))?;
    let cutoff = RELATIVE_SINGULAR_VALUE_CUTOFF * scale;
    let kept: Vec<usize> = svd
        .singular_values
        .iter()
        .enumerate()
        .filter_map(|(i, &s)| (s > cutoff).then_some(i))
        .collect();
    Ok(u.select_columns(kept.iter()))
}

/// Expands per-particle friction to the 3N Cartesian components, as `√γ`.
pub(crate) fn sqrt_friction_components(friction: &FrictionField) -> DVector<f64> {
    let sqrt = friction.sqrt();
    DVector::from_iterator(
        3 * sqrt.len(),
        sqrt.iter().flat_map(|&s| std::iter::repeat_n(s, 3)),
    )
}

/// Builds the friction-weighted orthonormal basis of a subspace.
///
/// Each basis vector is scaled by `√γ` per particle. The weighted exclusion
/// set is orthonormalized and projected out before the remaining vectors are
/// orthonormalized.
pub(crate) fn weighted_basis(
    structure: &Structure,
    friction: &FrictionField,
    subspace: &Subspace,
) -> Result<WeightedBasis, EngineError> {
    let sqrt_friction = sqrt_friction_components(friction);
    let mut basis = weighted_columns(&subspace.basis, structure, &sqrt_friction)?;
    let scale = basis.norm();

    if !subspace.excluded.is_empty() {
        let excluded = weighted_columns(&subspace.excluded, structure, &sqrt_friction)?;
        let excluded_scale = excluded.norm();
        let excluded = orthonormalize(excluded, excluded_scale)?;
        debug!(
            excluded = excluded.ncols(),
            "Projecting excluded directions out of the subspace."
        );
        let overlap = excluded.transpose() * &basis;
        basis -= &excluded * overlap;
    }

    let weighted = orthonormalize(basis, scale)?;
    if weighted.ncols() == 0 {
        return Err(EngineError::InvalidParameter(
            "subspace has no independent directions left".to_string(),
        ));
    }
    debug!(
        requested = subspace.basis.len(),
        dimension = weighted.ncols(),
        "Orthonormalized subspace basis."
    );

    let mut unweighted = weighted.clone();
    for (mut row, s) in unweighted.row_iter_mut().zip(sqrt_friction.iter()) {
        row /= *s;
    }
    Ok(WeightedBasis {
        weighted,
        unweighted,
    })
}
