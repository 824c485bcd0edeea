//! # Particle Fields Module
//!
//! This module implements the per-particle algebra used throughout the mode
//! analysis: quantities that take one value per particle (or per particle
//! pair) of a fixed [`Structure`](crate::core::models::structure::Structure).
//!
//! ## Overview
//!
//! Every field carries a [`SnapshotTag`](crate::core::models::structure::SnapshotTag)
//! identifying the structure and configuration version it was created for.
//! Binary operations verify the tags first and fail fast with
//! [`FieldError::IncompatibleUniverse`] or [`FieldError::StaleVersion`]; fields
//! are never silently coerced.
//!
//! ## Key Components
//!
//! - [`scalar`] - One scalar per particle (masses, friction, fluctuations)
//! - [`vector`] - One 3-vector per particle, also usable as a 3N-dimensional vector
//! - [`tensor`] - One 3×3 tensor per particle
//! - [`pair`] - One 3×3 tensor per particle pair, stored as an upper triangle
//! - [`mask`] - Boolean particle subsets
//! - [`dynamic`] - The closed variant [`ParticleField`] with table-driven dispatch
//! - [`kind`] - Field kinds and the table of allowed operations
//!
//! ## Usage
//!
//! ```ignore
//! use brownmodes::core::fields::{ScalarField, VectorField};
//!
//! let masses = structure.masses();
//! let displacement = VectorField::zeros(&structure);
//! let weighted = displacement.weighted_by(&masses)?;
//! let per_particle = weighted.dot(&displacement)?;
//! ```

pub mod dynamic;
pub mod error;
pub mod kind;
pub mod mask;
pub mod pair;
pub mod scalar;
pub mod tensor;
pub mod vector;

pub use dynamic::ParticleField;
pub use error::FieldError;
pub use kind::{FieldKind, Operation};
pub use mask::ParticleMask;
pub use pair::PairTensorField;
pub use scalar::ScalarField;
pub use tensor::TensorField;
pub use vector::VectorField;

/// Implements the operations shared by all per-particle fields.
///
/// The value type must be `Copy` and support addition, subtraction, negation
/// and multiplication/division by `f64`.
macro_rules! per_particle_field {
    ($field:ident, $value:ty, $zero:expr, $kind:expr) => {
        impl $field {
            /// The kind of this field type.
            pub const KIND: $crate::core::fields::kind::FieldKind = $kind;

            /// Creates a zero-filled field over `structure`.
            pub fn zeros(structure: &$crate::core::models::structure::Structure) -> Self {
                Self::from_values(structure.tag(), vec![$zero; structure.len()])
            }

            /// Creates a field from caller-supplied per-particle values.
            ///
            /// # Errors
            ///
            /// Returns [`FieldError::SizeMismatch`](crate::core::fields::FieldError::SizeMismatch)
            /// if `values.len()` differs from the particle count.
            pub fn new(
                structure: &$crate::core::models::structure::Structure,
                values: Vec<$value>,
            ) -> Result<Self, $crate::core::fields::error::FieldError> {
                if values.len() != structure.len() {
                    return Err($crate::core::fields::error::FieldError::SizeMismatch {
                        expected: structure.len(),
                        found: values.len(),
                    });
                }
                Ok(Self::from_values(structure.tag(), values))
            }

            pub(crate) fn from_values(
                tag: $crate::core::models::structure::SnapshotTag,
                values: Vec<$value>,
            ) -> Self {
                debug_assert_eq!(tag.len, values.len());
                Self { tag, values }
            }

            /// Returns the snapshot tag this field was created for.
            pub fn tag(&self) -> $crate::core::models::structure::SnapshotTag {
                self.tag
            }

            /// Returns the number of particles.
            pub fn len(&self) -> usize {
                self.values.len()
            }

            /// Returns `true` if the field has no particles.
            pub fn is_empty(&self) -> bool {
                self.values.is_empty()
            }

            /// Returns the per-particle values.
            pub fn values(&self) -> &[$value] {
                &self.values
            }

            /// Returns an iterator over the per-particle values.
            pub fn iter(&self) -> std::slice::Iter<'_, $value> {
                self.values.iter()
            }

            /// Returns the value for particle `index`, if it exists.
            pub fn get(&self, index: usize) -> Option<$value> {
                self.values.get(index).copied()
            }

            /// Sets the value for particle `index`.
            pub fn set(
                &mut self,
                index: usize,
                value: $value,
            ) -> Result<(), $crate::core::fields::error::FieldError> {
                let len = self.values.len();
                let slot = self.values.get_mut(index).ok_or(
                    $crate::core::fields::error::FieldError::IndexOutOfRange { index, len },
                )?;
                *slot = value;
                Ok(())
            }

            /// Elementwise sum with a field of the same kind.
            pub fn checked_add(
                &self,
                other: &Self,
            ) -> Result<Self, $crate::core::fields::error::FieldError> {
                self.tag.ensure_compatible(&other.tag)?;
                Ok(Self::from_values(
                    self.tag,
                    self.values
                        .iter()
                        .zip(&other.values)
                        .map(|(a, b)| *a + *b)
                        .collect(),
                ))
            }

            /// Elementwise difference with a field of the same kind.
            pub fn checked_sub(
                &self,
                other: &Self,
            ) -> Result<Self, $crate::core::fields::error::FieldError> {
                self.tag.ensure_compatible(&other.tag)?;
                Ok(Self::from_values(
                    self.tag,
                    self.values
                        .iter()
                        .zip(&other.values)
                        .map(|(a, b)| *a - *b)
                        .collect(),
                ))
            }

            /// Multiplies each particle's value by the matching entry of `factors`.
            pub fn weighted_by(
                &self,
                factors: &$crate::core::fields::scalar::ScalarField,
            ) -> Result<Self, $crate::core::fields::error::FieldError> {
                self.tag.ensure_compatible(&factors.tag())?;
                Ok(Self::from_values(
                    self.tag,
                    self.values
                        .iter()
                        .zip(factors.values())
                        .map(|(a, f)| *a * *f)
                        .collect(),
                ))
            }

            /// Divides each particle's value by the matching entry of `divisors`.
            pub fn divided_by(
                &self,
                divisors: &$crate::core::fields::scalar::ScalarField,
            ) -> Result<Self, $crate::core::fields::error::FieldError> {
                self.tag.ensure_compatible(&divisors.tag())?;
                Ok(Self::from_values(
                    self.tag,
                    self.values
                        .iter()
                        .zip(divisors.values())
                        .map(|(a, d)| *a / *d)
                        .collect(),
                ))
            }

            /// Copies all values from a compatible field.
            pub fn assign(
                &mut self,
                other: &Self,
            ) -> Result<(), $crate::core::fields::error::FieldError> {
                self.tag.ensure_compatible(&other.tag)?;
                self.values.copy_from_slice(&other.values);
                Ok(())
            }

            /// Multiplies all values by `factor` in place.
            pub fn scale_by(&mut self, factor: f64) {
                self.values.iter_mut().for_each(|v| *v = *v * factor);
            }

            /// Returns the sum of the values of all particles.
            pub fn sum_over_particles(&self) -> $value {
                self.values.iter().fold($zero, |acc, v| acc + *v)
            }
        }

        impl std::ops::Index<usize> for $field {
            type Output = $value;

            fn index(&self, index: usize) -> &Self::Output {
                &self.values[index]
            }
        }

        impl std::ops::Mul<f64> for &$field {
            type Output = $field;

            fn mul(self, rhs: f64) -> Self::Output {
                $field::from_values(self.tag, self.values.iter().map(|v| *v * rhs).collect())
            }
        }

        impl std::ops::Mul<f64> for $field {
            type Output = $field;

            fn mul(mut self, rhs: f64) -> Self::Output {
                self.scale_by(rhs);
                self
            }
        }

        impl std::ops::Div<f64> for &$field {
            type Output = $field;

            fn div(self, rhs: f64) -> Self::Output {
                $field::from_values(self.tag, self.values.iter().map(|v| *v / rhs).collect())
            }
        }

        impl std::ops::MulAssign<f64> for $field {
            fn mul_assign(&mut self, rhs: f64) {
                self.scale_by(rhs);
            }
        }

        impl std::ops::Neg for &$field {
            type Output = $field;

            fn neg(self) -> Self::Output {
                $field::from_values(self.tag, self.values.iter().map(|v| -*v).collect())
            }
        }
    };
}

pub(crate) use per_particle_field;
