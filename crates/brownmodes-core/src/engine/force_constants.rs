use super::config::ModeConfig;
use super::error::EngineError;
use super::friction::FrictionField;
use super::progress::{Progress, ProgressReporter};
use super::subspace::{self, WeightedBasis};
use crate::core::forcefield::{ForceField, ForceFieldError};
use crate::core::models::structure::Structure;
use nalgebra::{DMatrix, DVector, Point3};
use nalgebra_sparse::CsrMatrix;
use tracing::{debug, info, instrument};

/// The symmetric friction-weighted force-constant matrix, ready for diagonalization.
///
/// In subspace mode `basis` holds the orthonormal weighted basis `P` used to
/// lift eigenvectors back to 3N-dimensional weighted space.
#[derive(Debug, Clone)]
pub(crate) struct WeightedForceConstants {
    pub matrix: DMatrix<f64>,
    pub basis: Option<DMatrix<f64>>,
}

impl WeightedForceConstants {
    pub fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn weighting(&self) -> &'static str {
        match self.basis {
            Some(_) => "friction-weighted subspace",
            None => "friction-weighted",
        }
    }
}

#[instrument(skip_all, name = "force_constant_builder")]
pub(crate) fn build(
    structure: &Structure,
    forcefield: &dyn ForceField,
    friction: &FrictionField,
    config: &ModeConfig,
    reporter: &ProgressReporter,
) -> Result<WeightedForceConstants, EngineError> {
    structure.tag().ensure_compatible(&friction.values().tag())?;
    if structure.is_empty() {
        return Err(EngineError::InvalidParameter(
            "structure has no particles".to_string(),
        ));
    }
    if config.delta.is_some() && config.subspace.is_none() {
        return Err(super::config::ConfigError::NumericDifferentiationRequiresSubspace.into());
    }

    reporter.report(Progress::PhaseStart {
        name: "Force Constants",
    });
    let result = match &config.subspace {
        None => build_full(structure, forcefield, friction, config.sparse),
        Some(selection) => {
            let basis = subspace::weighted_basis(structure, friction, selection)?;
            build_projected(structure, forcefield, basis, config, reporter)
        }
    }?;
    reporter.report(Progress::PhaseFinish);

    info!(
        dimension = result.dimension(),
        weighting = result.weighting(),
        "Weighted force-constant matrix ready."
    );
    Ok(result)
}

fn dense_force_constants(
    structure: &Structure,
    forcefield: &dyn ForceField,
    positions: &[Point3<f64>],
) -> Result<DMatrix<f64>, EngineError> {
    let matrix = forcefield.force_constants(structure, positions)?;
    let n = 3 * structure.len();
    if matrix.nrows() != n || matrix.ncols() != n {
        return Err(ForceFieldError::SizeMismatch {
            expected: structure.len(),
            found: matrix.nrows().max(matrix.ncols()) / 3,
        }
        .into());
    }
    Ok(matrix)
}

fn sparse_force_constants(
    structure: &Structure,
    forcefield: &dyn ForceField,
    positions: &[Point3<f64>],
) -> Result<CsrMatrix<f64>, EngineError> {
    let coo = forcefield.sparse_force_constants(structure, positions)?;
    let n = 3 * structure.len();
    if coo.nrows() != n || coo.ncols() != n {
        return Err(ForceFieldError::SizeMismatch {
            expected: structure.len(),
            found: coo.nrows().max(coo.ncols()) / 3,
        }
        .into());
    }
    let csr = CsrMatrix::from(&coo);
    debug!(nonzeros = csr.nnz(), "Received sparse force constants.");
    Ok(csr)
}

/// Weights every element `H[ai, bj]` by `1 / √(γ_a γ_b)`.
fn build_full(
    structure: &Structure,
    forcefield: &dyn ForceField,
    friction: &FrictionField,
    sparse: bool,
) -> Result<WeightedForceConstants, EngineError> {
    let positions = structure.positions();
    let mut matrix = if sparse {
        let csr = sparse_force_constants(structure, forcefield, &positions)?;
        info!("Densifying sparse force constants for full diagonalization.");
        DMatrix::from(&csr)
    } else {
        dense_force_constants(structure, forcefield, &positions)?
    };

    let inv_sqrt: DVector<f64> = subspace::sqrt_friction_components(friction).map(|s| 1.0 / s);
    for (j, mut column) in matrix.column_iter_mut().enumerate() {
        column.component_mul_assign(&inv_sqrt);
        column *= inv_sqrt[j];
    }
    symmetrize(&mut matrix);

    Ok(WeightedForceConstants {
        matrix,
        basis: None,
    })
}

/// Computes `Qᵀ H Q` for the unweighted subspace basis `Q`.
fn build_projected(
    structure: &Structure,
    forcefield: &dyn ForceField,
    basis: WeightedBasis,
    config: &ModeConfig,
    reporter: &ProgressReporter,
) -> Result<WeightedForceConstants, EngineError> {
    let positions = structure.positions();
    let q = &basis.unweighted;

    let hq = if let Some(delta) = config.delta {
        if config.sparse {
            debug!("Numeric differentiation requested; the sparse flag is ignored.");
        }
        numeric_hessian_times(structure, forcefield, &positions, q, delta, reporter)?
    } else if config.sparse {
        let csr = sparse_force_constants(structure, forcefield, &positions)?;
        &csr * q
    } else {
        let h = dense_force_constants(structure, forcefield, &positions)?;
        &h * q
    };

    let mut matrix = q.transpose() * hq;
    symmetrize(&mut matrix);
    debug!(
        dimension = matrix.nrows(),
        numeric = config.delta.is_some(),
        "Projected force constants onto subspace."
    );

    Ok(WeightedForceConstants {
        matrix,
        basis: Some(basis.weighted),
    })
}

/// Approximates `H q` for every column `q` by central differences of the gradient.
///
/// The displacement is taken along the unit vector `u = q / |q|` with step
/// `delta`, and the result is rescaled by `|q|`.
fn numeric_hessian_times(
    structure: &Structure,
    forcefield: &dyn ForceField,
    positions: &[Point3<f64>],
    q: &DMatrix<f64>,
    delta: f64,
    reporter: &ProgressReporter,
) -> Result<DMatrix<f64>, EngineError> {
    let mut hq = DMatrix::zeros(q.nrows(), q.ncols());
    reporter.report(Progress::TaskStart {
        total_steps: q.ncols() as u64,
    });
    for (j, column) in q.column_iter().enumerate() {
        let length = column.norm();
        let direction = column / length;
        let plus = forcefield
            .gradient(structure, &displaced(positions, &direction, delta))?
            .to_flat();
        let minus = forcefield
            .gradient(structure, &displaced(positions, &direction, -delta))?
            .to_flat();
        hq.set_column(j, &((plus - minus) * (length / (2.0 * delta))));
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(hq)
}

fn displaced(positions: &[Point3<f64>], direction: &DVector<f64>, step: f64) -> Vec<Point3<f64>> {
    positions
        .iter()
        .enumerate()
        .map(|(a, p)| {
            Point3::new(
                p.x + step * direction[3 * a],
                p.y + step * direction[3 * a + 1],
                p.z + step * direction[3 * a + 2],
            )
        })
        .collect()
}

fn symmetrize(matrix: &mut DMatrix<f64>) {
    let transpose = matrix.transpose();
    *matrix += transpose;
    *matrix *= 0.5;
}
