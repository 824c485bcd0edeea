//! # Force Field Module
//!
//! This module defines how the mode analysis talks to a force field. The analysis
//! never evaluates interactions itself; it asks a [`ForceField`] collaborator for
//! energies, first derivatives and, when available, the full matrix of second
//! derivatives (the force constants).
//!
//! ## Overview
//!
//! Production force fields live outside this crate and implement [`ForceField`].
//! A small harmonic reference collaborator is included so that the pipeline can
//! be exercised without one:
//!
//! - **Harmonic springs** between particle pairs (elastic network models)
//! - **Harmonic anchors** tying particles to fixed points in space
//! - **Analytic derivatives** for gradients, dense and sparse force constants
//!
//! ## Key Components
//!
//! - [`harmonic`] - The harmonic spring network collaborator
//! - [`potentials`] - Pair and anchor potentials with their derivatives
//! - [`check`] - Finite-difference consistency checks for any collaborator
//!
//! ## Usage
//!
//! ```ignore
//! use brownmodes::core::forcefield::{ForceField, harmonic::HarmonicNetwork};
//!
//! let network = HarmonicNetwork::elastic_network(&structure, 0.8, 400.0);
//! let hessian = network.force_constants(&structure, &structure.positions())?;
//! ```

pub mod check;
pub mod harmonic;
pub(crate) mod potentials;

use crate::core::fields::vector::VectorField;
use crate::core::models::structure::Structure;
use nalgebra::{DMatrix, Point3};
use nalgebra_sparse::CooMatrix;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceFieldError {
    #[error("Force field cannot provide {0}")]
    DerivativesUnavailable(String),

    #[error("Configuration has {found} positions but the structure has {expected} particles")]
    SizeMismatch { expected: usize, found: usize },

    #[error("Particle index {index} out of range for {len} particles")]
    ParticleIndexOutOfRange { index: usize, len: usize },

    #[error("Derivatives undefined for coincident particles {first} and {second}")]
    DegenerateGeometry { first: usize, second: usize },
}

/// A source of energies and derivatives for the particles of a [`Structure`].
///
/// All methods evaluate at an explicit `configuration` (positions in the
/// particle order of `structure`) rather than at the structure's own
/// positions, so that collaborators can be queried at displaced geometries.
/// Returned fields carry the tag of `structure`.
///
/// Implementations that cannot compute second derivatives keep the default
/// [`force_constants`](Self::force_constants), which reports
/// [`ForceFieldError::DerivativesUnavailable`].
pub trait ForceField: Send + Sync {
    /// Returns the potential energy in kJ/mol.
    fn energy(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<f64, ForceFieldError>;

    /// Returns the energy gradient in kJ/(mol·nm).
    fn gradient(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<VectorField, ForceFieldError>;

    /// Returns the dense 3N×3N matrix of second derivatives.
    fn force_constants(
        &self,
        _structure: &Structure,
        _configuration: &[Point3<f64>],
    ) -> Result<DMatrix<f64>, ForceFieldError> {
        Err(ForceFieldError::DerivativesUnavailable(
            "second derivatives".to_string(),
        ))
    }

    /// Returns the 3N×3N matrix of second derivatives in sparse form.
    ///
    /// Duplicate entries are summed when the matrix is converted to a
    /// compressed format. The default converts the dense matrix.
    fn sparse_force_constants(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<CooMatrix<f64>, ForceFieldError> {
        let dense = self.force_constants(structure, configuration)?;
        Ok(CooMatrix::from(&dense))
    }
}

pub(crate) fn ensure_configuration_size(
    structure: &Structure,
    configuration: &[Point3<f64>],
) -> Result<(), ForceFieldError> {
    if configuration.len() != structure.len() {
        return Err(ForceFieldError::SizeMismatch {
            expected: structure.len(),
            found: configuration.len(),
        });
    }
    Ok(())
}
