use super::config::Temperature;
use super::error::EngineError;
use super::friction::FrictionField;
use super::solver::Eigensystem;
use crate::core::fields::scalar::ScalarField;
use crate::core::fields::tensor::TensorField;
use crate::core::fields::vector::VectorField;
use crate::core::models::structure::{SnapshotTag, Structure};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

/// The coordinate system a mode displacement is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeBasis {
    /// Friction-weighted coordinates; the displacement has unit norm.
    Raw,
    /// Cartesian coordinates, the raw displacement divided by `√γ`.
    Physical,
}

/// A single relaxation mode.
///
/// Two modes compare equal when they belong to the same structure snapshot and
/// have the same index, regardless of the basis they are expressed in.
#[derive(Debug, Clone)]
pub struct Mode {
    pub index: usize,
    /// The inverse relaxation time in 1/ps.
    pub inv_relaxation_time: f64,
    pub displacement: VectorField,
    pub basis: ModeBasis,
}

impl Mode {
    /// Returns the relaxation time in ps, infinite for zero-rate modes.
    pub fn relaxation_time(&self) -> f64 {
        1.0 / self.inv_relaxation_time
    }

    pub fn tag(&self) -> SnapshotTag {
        self.displacement.tag()
    }
}

impl PartialEq for Mode {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag() && self.index == other.index
    }
}

/// The relaxation modes of a structure, sorted by ascending inverse relaxation time.
///
/// A mode set owns the eigenvalues and the raw eigenvector matrix produced by
/// the solver; individual [`Mode`] values are built on request. Modes with
/// index below `first_mode` (six for a free molecule) describe rigid-body
/// motion and have (near) zero rate.
#[derive(Debug, Clone)]
pub struct ModeSet {
    structure: Structure,
    friction: FrictionField,
    sqrt_friction: ScalarField,
    temperature: Temperature,
    eigenvalues: DVector<f64>,
    vectors: DMatrix<f64>,
    order: Vec<usize>,
}

impl ModeSet {
    pub(crate) fn new(
        structure: Structure,
        friction: FrictionField,
        temperature: Temperature,
        eigensystem: Eigensystem,
    ) -> Self {
        let sqrt_friction = friction.sqrt();
        Self {
            structure,
            friction,
            sqrt_friction,
            temperature,
            eigenvalues: eigensystem.eigenvalues,
            vectors: eigensystem.vectors,
            order: eigensystem.order,
        }
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn tag(&self) -> SnapshotTag {
        self.structure.tag()
    }

    pub fn friction(&self) -> &FrictionField {
        &self.friction
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// Returns the thermal energy used for averages.
    pub fn kt(&self) -> f64 {
        self.temperature.kt()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<usize, EngineError> {
        self.order
            .get(index)
            .copied()
            .ok_or(EngineError::ModeIndexOutOfRange {
                index,
                len: self.order.len(),
            })
    }

    /// Returns the inverse relaxation time of the mode at sorted position `index`.
    pub fn inv_relaxation_time(&self, index: usize) -> Result<f64, EngineError> {
        Ok(self.eigenvalues[self.check_index(index)?])
    }

    /// Returns the relaxation time of the mode at sorted position `index`.
    pub fn relaxation_time(&self, index: usize) -> Result<f64, EngineError> {
        Ok(1.0 / self.inv_relaxation_time(index)?)
    }

    /// Returns all inverse relaxation times in ascending order.
    pub fn inv_relaxation_times(&self) -> Vec<f64> {
        self.order.iter().map(|&k| self.eigenvalues[k]).collect()
    }

    pub(crate) fn raw_displacements(
        &self,
        index: usize,
    ) -> Result<Vec<Vector3<f64>>, EngineError> {
        let column: Vec<f64> = self
            .vectors
            .column(self.check_index(index)?)
            .iter()
            .copied()
            .collect();
        Ok(column
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect())
    }

    pub(crate) fn sqrt_friction(&self) -> &ScalarField {
        &self.sqrt_friction
    }

    /// Returns the mode at sorted position `index` in friction-weighted coordinates.
    pub fn raw_mode(&self, index: usize) -> Result<Mode, EngineError> {
        let displacement =
            VectorField::from_values(self.structure.tag(), self.raw_displacements(index)?);
        Ok(Mode {
            index,
            inv_relaxation_time: self.inv_relaxation_time(index)?,
            displacement,
            basis: ModeBasis::Raw,
        })
    }

    /// Returns the mode at sorted position `index` in Cartesian coordinates.
    pub fn mode(&self, index: usize) -> Result<Mode, EngineError> {
        let raw = self.raw_mode(index)?;
        Ok(Mode {
            displacement: raw.displacement.divided_by(&self.sqrt_friction)?,
            basis: ModeBasis::Physical,
            ..raw
        })
    }

    pub fn get(&self, index: usize) -> Option<Mode> {
        self.mode(index).ok()
    }

    /// Iterates over all modes in Cartesian coordinates, slowest first.
    pub fn iter(&self) -> impl Iterator<Item = Mode> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Returns `(λ_i, raw displacements)` for every mode from `first_mode` on.
    ///
    /// # Errors
    ///
    /// Thermal averages divide by the rate, so a zero-rate mode in this range
    /// is reported as [`EngineError::InvalidParameter`].
    pub(crate) fn relaxing_modes(
        &self,
        first_mode: usize,
    ) -> Result<Vec<(f64, Vec<Vector3<f64>>)>, EngineError> {
        (first_mode..self.len())
            .map(|i| {
                let rate = self.inv_relaxation_time(i)?;
                if rate <= 0.0 {
                    return Err(EngineError::InvalidParameter(format!(
                        "mode {i} has zero inverse relaxation time; increase first_mode"
                    )));
                }
                Ok((rate, self.raw_displacements(i)?))
            })
            .collect()
    }

    /// Returns the positional fluctuation `kT Σ_i |raw_i|² / λ_i / γ` per particle.
    ///
    /// Modes with sorted index below `first_mode` are skipped; with
    /// `first_mode >= len()` the result is the zero field.
    pub fn fluctuations(&self, first_mode: usize) -> Result<ScalarField, EngineError> {
        let mut sum = vec![0.0; self.structure.len()];
        for (rate, raw) in self.relaxing_modes(first_mode)? {
            for (total, d) in sum.iter_mut().zip(&raw) {
                *total += d.norm_squared() / rate;
            }
        }
        let field = ScalarField::from_values(self.structure.tag(), sum) * self.kt();
        Ok(field.divided_by(self.friction.values())?)
    }

    /// Returns the fluctuation tensor `kT Σ_i (raw_i ⊗ raw_i) / λ_i / γ` per particle.
    pub fn fluctuation_tensor(&self, first_mode: usize) -> Result<TensorField, EngineError> {
        let mut sum = vec![Matrix3::zeros(); self.structure.len()];
        for (rate, raw) in self.relaxing_modes(first_mode)? {
            for (total, d) in sum.iter_mut().zip(&raw) {
                *total += d * d.transpose() / rate;
            }
        }
        let field = TensorField::from_values(self.structure.tag(), sum) * self.kt();
        Ok(field.divided_by(self.friction.values())?)
    }
}
