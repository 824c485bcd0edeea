use super::kind::FieldKind;
use super::per_particle_field;
use super::scalar::ScalarField;
use crate::core::models::structure::SnapshotTag;
use nalgebra::{Matrix3, Vector3};

/// One rank-2 tensor per particle.
///
/// Tensor fields can be added to each other and multiplied with numbers or
/// scalar fields. Products with vectors or other tensors are not defined.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorField {
    tag: SnapshotTag,
    values: Vec<Matrix3<f64>>,
}

per_particle_field!(TensorField, Matrix3<f64>, Matrix3::zeros(), FieldKind::TENSOR);

impl TensorField {
    /// Returns the trace of each particle's tensor.
    pub fn trace(&self) -> ScalarField {
        ScalarField::from_values(self.tag, self.values.iter().map(|t| t.trace()).collect())
    }

    /// Returns `v·(T_a v)` for every particle.
    pub fn quadratic_form(&self, v: &Vector3<f64>) -> ScalarField {
        ScalarField::from_values(self.tag, self.values.iter().map(|t| v.dot(&(t * v))).collect())
    }
}
