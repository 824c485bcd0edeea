use super::error::EngineError;
use crate::core::fields::scalar::ScalarField;
use crate::core::models::structure::Structure;

/// Per-particle friction coefficients, strictly positive, in 1/ps.
///
/// This is a distinct type from a plain [`ScalarField`] so that friction
/// weighting cannot be confused with mass weighting.
#[derive(Debug, Clone, PartialEq)]
pub struct FrictionField(ScalarField);

impl FrictionField {
    /// Validates a scalar field as friction coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFriction`] for the first value that is
    /// not positive and finite.
    pub fn new(values: ScalarField) -> Result<Self, EngineError> {
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(EngineError::InvalidFriction { index, value });
        }
        Ok(Self(values))
    }

    /// The same friction coefficient for every particle.
    pub fn uniform(structure: &Structure, value: f64) -> Result<Self, EngineError> {
        Self::new(ScalarField::new(structure, vec![value; structure.len()])?)
    }

    pub fn values(&self) -> &ScalarField {
        &self.0
    }

    pub fn into_inner(self) -> ScalarField {
        self.0
    }

    /// Returns `sqrt(γ_a)` for every particle.
    pub fn sqrt(&self) -> ScalarField {
        self.0.map(f64::sqrt)
    }
}
