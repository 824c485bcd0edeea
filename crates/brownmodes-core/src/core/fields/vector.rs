use super::error::FieldError;
use super::kind::FieldKind;
use super::per_particle_field;
use super::scalar::ScalarField;
use super::tensor::TensorField;
use crate::core::models::structure::SnapshotTag;
use nalgebra::{DVector, Vector3};

/// One 3-vector per particle.
///
/// Vector fields represent configurations, gradients and mode displacements.
/// Multiplication with a [`ScalarField`] scales each particle's vector; the
/// product with another vector field is the per-particle dot product. Methods
/// such as [`norm`](Self::norm) and [`dot_product`](Self::dot_product) treat the
/// field as a single vector in 3N-dimensional space.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    tag: SnapshotTag,
    values: Vec<Vector3<f64>>,
}

per_particle_field!(VectorField, Vector3<f64>, Vector3::zeros(), FieldKind::VECTOR);

impl VectorField {
    /// Builds a field from a flat 3N-component vector (x0, y0, z0, x1, ...).
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the slice length is not three
    /// times the particle count of `tag`.
    pub fn from_flat(tag: SnapshotTag, flat: &[f64]) -> Result<Self, FieldError> {
        if flat.len() != 3 * tag.len {
            return Err(FieldError::SizeMismatch {
                expected: 3 * tag.len,
                found: flat.len(),
            });
        }
        Ok(Self::from_values(
            tag,
            flat.chunks_exact(3)
                .map(|c| Vector3::new(c[0], c[1], c[2]))
                .collect(),
        ))
    }

    /// Returns the field as a flat 3N-component vector.
    pub fn to_flat(&self) -> DVector<f64> {
        DVector::from_iterator(
            3 * self.values.len(),
            self.values.iter().flat_map(|v| v.iter().copied()),
        )
    }

    /// Per-particle dot product with another vector field.
    pub fn dot(&self, other: &VectorField) -> Result<ScalarField, FieldError> {
        self.tag.ensure_compatible(&other.tag)?;
        Ok(ScalarField::from_values(
            self.tag,
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a.dot(b))
                .collect(),
        ))
    }

    /// Per-particle dot product with a constant vector.
    pub fn project_on(&self, direction: &Vector3<f64>) -> ScalarField {
        ScalarField::from_values(self.tag, self.values.iter().map(|a| a.dot(direction)).collect())
    }

    /// Per-particle dyadic (outer) product with another vector field.
    pub fn dyadic(&self, other: &VectorField) -> Result<TensorField, FieldError> {
        self.tag.ensure_compatible(&other.tag)?;
        Ok(TensorField::from_values(
            self.tag,
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a * b.transpose())
                .collect(),
        ))
    }

    /// Returns the length of each particle's vector.
    pub fn length(&self) -> ScalarField {
        ScalarField::from_values(self.tag, self.values.iter().map(|v| v.norm()).collect())
    }

    /// Returns the norm of the field seen as a 3N-dimensional vector.
    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|v| v.norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    /// Returns the 3N-dimensional dot product with another vector field.
    pub fn dot_product(&self, other: &VectorField) -> Result<f64, FieldError> {
        self.tag.ensure_compatible(&other.tag)?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a.dot(b))
            .sum())
    }

    /// Returns the mass-weighted norm `sqrt(Σ m_a |v_a|² / Σ m_a)`.
    pub fn mass_weighted_norm(&self, masses: &ScalarField) -> Result<f64, FieldError> {
        self.tag.ensure_compatible(&masses.tag())?;
        let total_mass = masses.sum_over_particles();
        let weighted: f64 = self
            .values
            .iter()
            .zip(masses.values())
            .map(|(v, m)| m * v.norm_squared())
            .sum();
        Ok((weighted / total_mass).sqrt())
    }

    /// Returns the mass-weighted 3N-dimensional dot product `Σ m_a v_a·w_a`.
    pub fn mass_weighted_dot_product(
        &self,
        other: &VectorField,
        masses: &ScalarField,
    ) -> Result<f64, FieldError> {
        self.tag.ensure_compatible(&other.tag)?;
        self.tag.ensure_compatible(&masses.tag())?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .zip(masses.values())
            .map(|((a, b), m)| m * a.dot(b))
            .sum())
    }

    /// Returns a copy rescaled to the given 3N-dimensional norm.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ZeroNorm`] if the field is zero.
    pub fn scaled_to_norm(&self, norm: f64) -> Result<Self, FieldError> {
        let current = self.norm();
        if current == 0.0 {
            return Err(FieldError::ZeroNorm);
        }
        Ok(self * (norm / current))
    }

    /// Returns a copy rescaled to the given mass-weighted norm.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ZeroNorm`] if the mass-weighted norm is zero.
    pub fn scaled_to_mass_weighted_norm(
        &self,
        norm: f64,
        masses: &ScalarField,
    ) -> Result<Self, FieldError> {
        let current = self.mass_weighted_norm(masses)?;
        if current == 0.0 || !current.is_finite() {
            return Err(FieldError::ZeroNorm);
        }
        Ok(self * (norm / current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::core::models::structure::Structure;
    use nalgebra::{Matrix3, Point3};

    const TOLERANCE: f64 = 1e-12;

    fn structure() -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::origin(), 1.0),
            Particle::new("B", Point3::new(1.0, 0.0, 0.0), 3.0),
        ])
    }

    fn field(s: &Structure, a: [f64; 3], b: [f64; 3]) -> VectorField {
        VectorField::new(s, vec![Vector3::from(a), Vector3::from(b)]).unwrap()
    }

    #[test]
    fn add_then_subtract_restores_original() {
        let s = structure();
        let a = field(&s, [1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]);
        let b = field(&s, [0.3, -7.0, 2.0], [4.0, 4.0, 4.0]);
        let round_trip = a.checked_add(&b).unwrap().checked_sub(&b).unwrap();
        for (x, y) in round_trip.iter().zip(a.iter()) {
            assert!((x - y).norm() < TOLERANCE);
        }
    }

    #[test]
    fn sum_over_particles_returns_vector_sum() {
        let s = structure();
        let a = field(&s, [1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        assert_eq!(a.sum_over_particles(), Vector3::new(5.0, 7.0, 9.0));
    }

    #[test]
    fn dot_gives_per_particle_scalar() {
        let s = structure();
        let a = field(&s, [1.0, 2.0, 3.0], [1.0, 0.0, 0.0]);
        let b = field(&s, [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]);
        assert_eq!(a.dot(&b).unwrap().values(), &[6.0, 0.0]);
        assert_eq!(a.dot_product(&b).unwrap(), 6.0);
    }

    #[test]
    fn dyadic_gives_outer_product_per_particle() {
        let s = structure();
        let a = field(&s, [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
        let b = field(&s, [0.0, 1.0, 0.0], [0.0, 3.0, 0.0]);
        let t = a.dyadic(&b).unwrap();
        let mut expected0 = Matrix3::zeros();
        expected0[(0, 1)] = 1.0;
        let mut expected1 = Matrix3::zeros();
        expected1[(1, 1)] = 6.0;
        assert_eq!(t[0], expected0);
        assert_eq!(t[1], expected1);
    }

    #[test]
    fn weighted_by_scales_each_vector() {
        let s = structure();
        let a = field(&s, [1.0, 1.0, 1.0], [2.0, 0.0, 0.0]);
        let w = ScalarField::new(&s, vec![2.0, 0.5]).unwrap();
        let scaled = a.weighted_by(&w).unwrap();
        assert_eq!(scaled[0], Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(scaled[1], Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn norm_and_scaled_to_norm() {
        let s = structure();
        let a = field(&s, [3.0, 0.0, 0.0], [0.0, 4.0, 0.0]);
        assert!((a.norm() - 5.0).abs() < TOLERANCE);
        let unit = a.scaled_to_norm(1.0).unwrap();
        assert!((unit.norm() - 1.0).abs() < TOLERANCE);
        assert_eq!(
            VectorField::zeros(&s).scaled_to_norm(1.0),
            Err(FieldError::ZeroNorm)
        );
    }

    #[test]
    fn mass_weighted_norm_and_rescaling() {
        let s = structure();
        let masses = s.masses();
        let a = field(&s, [2.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        // sqrt(1 * 4 / 4) = 1
        assert!((a.mass_weighted_norm(&masses).unwrap() - 1.0).abs() < TOLERANCE);
        let b = a.scaled_to_mass_weighted_norm(2.0, &masses).unwrap();
        assert!((b.mass_weighted_norm(&masses).unwrap() - 2.0).abs() < TOLERANCE);
        let c = field(&s, [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!((a.mass_weighted_dot_product(&c, &masses).unwrap() - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn flat_round_trip_preserves_layout() {
        let s = structure();
        let a = field(&s, [1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        let flat = a.to_flat();
        assert_eq!(flat.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(VectorField::from_flat(s.tag(), flat.as_slice()).unwrap(), a);
        assert!(matches!(
            VectorField::from_flat(s.tag(), &[1.0, 2.0]),
            Err(FieldError::SizeMismatch { expected: 6, found: 2 })
        ));
    }

    #[test]
    fn length_and_projection() {
        let s = structure();
        let a = field(&s, [3.0, 4.0, 0.0], [0.0, 0.0, 2.0]);
        assert_eq!(a.length().values(), &[5.0, 2.0]);
        assert_eq!(a.project_on(&Vector3::z()).values(), &[0.0, 2.0]);
    }
}
