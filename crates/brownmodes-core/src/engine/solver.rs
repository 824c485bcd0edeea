use super::error::EngineError;
use super::force_constants::WeightedForceConstants;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use tracing::{debug, info, instrument};

/// Eigenvalues and raw eigenvectors of a weighted force-constant matrix.
///
/// `vectors` has one unit-norm column per eigenvalue in 3N-dimensional
/// friction-weighted space. `order` lists the column indices by ascending
/// eigenvalue; the columns themselves are left in solver order.
#[derive(Debug, Clone)]
pub(crate) struct Eigensystem {
    pub eigenvalues: DVector<f64>,
    pub vectors: DMatrix<f64>,
    pub order: Vec<usize>,
}

/// Diagonalizes the weighted matrix and lifts the eigenvectors to 3N space.
///
/// The matrix is consumed. Negative eigenvalues whose magnitude is at most
/// `tolerance` times the largest eigenvalue magnitude are set to zero; more
/// negative eigenvalues are an error. An empty matrix is rejected with
/// [`EngineError::InvalidParameter`].
#[instrument(skip_all, name = "mode_solver")]
pub(crate) fn solve(
    weighted: WeightedForceConstants,
    tolerance: f64,
    max_iterations: usize,
) -> Result<Eigensystem, EngineError> {
    let dimension = weighted.dimension();
    let weighting = weighted.weighting();
    let WeightedForceConstants { matrix, basis } = weighted;
    if dimension == 0 {
        return Err(EngineError::InvalidParameter(
            "cannot diagonalize an empty force-constant matrix".to_string(),
        ));
    }

    info!(dimension, weighting, "Diagonalizing weighted force constants.");
    let eigen = SymmetricEigen::try_new(matrix, f64::EPSILON, max_iterations).ok_or(
        EngineError::Diagonalization {
            dimension,
            weighting,
        },
    )?;
    let SymmetricEigen {
        eigenvectors,
        mut eigenvalues,
    } = eigen;

    clamp_negative_eigenvalues(&mut eigenvalues, tolerance, dimension)?;

    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigenvalues[a].total_cmp(&eigenvalues[b]));

    let vectors = match basis {
        Some(p) => p * eigenvectors,
        None => eigenvectors,
    };

    debug!(
        modes = eigenvalues.len(),
        slowest = order.first().map(|&i| eigenvalues[i]),
        fastest = order.last().map(|&i| eigenvalues[i]),
        "Eigensystem ready."
    );
    Ok(Eigensystem {
        eigenvalues,
        vectors,
        order,
    })
}

fn clamp_negative_eigenvalues(
    eigenvalues: &mut DVector<f64>,
    tolerance: f64,
    dimension: usize,
) -> Result<(), EngineError> {
    let threshold = tolerance * eigenvalues.amax();
    for (index, value) in eigenvalues.iter_mut().enumerate() {
        if *value >= 0.0 {
            continue;
        }
        if *value < -threshold {
            return Err(EngineError::NegativeEigenvalue {
                index,
                value: *value,
                tolerance: threshold,
                dimension,
            });
        }
        debug!(index, value = *value, "Clamping small negative eigenvalue to zero.");
        *value = 0.0;
    }
    Ok(())
}
