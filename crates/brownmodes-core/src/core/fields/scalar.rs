use super::kind::FieldKind;
use super::per_particle_field;
use crate::core::models::structure::SnapshotTag;

/// One scalar value per particle.
///
/// Scalar fields hold masses, friction coefficients, scattering lengths and
/// derived per-particle quantities such as positional fluctuations. They can
/// be added to each other and multiplied with plain numbers or with other
/// scalar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    tag: SnapshotTag,
    values: Vec<f64>,
}

per_particle_field!(ScalarField, f64, 0.0, FieldKind::SCALAR);

impl ScalarField {
    /// Returns the largest value, or `None` for an empty field.
    pub fn maximum(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Returns the smallest value, or `None` for an empty field.
    pub fn minimum(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Applies `function` to each value and returns the results as a new field.
    pub fn map(&self, function: impl Fn(f64) -> f64) -> Self {
        Self::from_values(self.tag, self.values.iter().map(|&v| function(v)).collect())
    }
}
