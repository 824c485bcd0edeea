use super::error::FieldError;
use super::scalar::ScalarField;
use crate::core::models::structure::{SnapshotTag, Structure};

/// A subset of the particles of a [`Structure`].
///
/// Masks select the particles that take part in a correlation average. They
/// carry the same compatibility tag as fields and can be turned into a 0/1
/// [`ScalarField`] for weighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleMask {
    tag: SnapshotTag,
    members: Vec<bool>,
}

impl ParticleMask {
    /// Selects every particle of `structure`.
    pub fn all(structure: &Structure) -> Self {
        Self {
            tag: structure.tag(),
            members: vec![true; structure.len()],
        }
    }

    /// Selects no particle of `structure`.
    pub fn none(structure: &Structure) -> Self {
        Self {
            tag: structure.tag(),
            members: vec![false; structure.len()],
        }
    }

    /// Selects the particles with the given indices.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::IndexOutOfRange`] for the first invalid index.
    pub fn from_indices(
        structure: &Structure,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<Self, FieldError> {
        let mut mask = Self::none(structure);
        let len = structure.len();
        for index in indices {
            let slot = mask
                .members
                .get_mut(index)
                .ok_or(FieldError::IndexOutOfRange { index, len })?;
            *slot = true;
        }
        Ok(mask)
    }

    /// Builds a mask from one flag per particle.
    pub fn from_bools(structure: &Structure, members: Vec<bool>) -> Result<Self, FieldError> {
        if members.len() != structure.len() {
            return Err(FieldError::SizeMismatch {
                expected: structure.len(),
                found: members.len(),
            });
        }
        Ok(Self {
            tag: structure.tag(),
            members,
        })
    }

    /// Selects the particles for which `predicate` holds.
    pub fn select(
        structure: &Structure,
        predicate: impl Fn(&crate::core::models::particle::Particle) -> bool,
    ) -> Self {
        Self {
            tag: structure.tag(),
            members: structure.particles().iter().map(predicate).collect(),
        }
    }

    pub fn tag(&self) -> SnapshotTag {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.get(index).copied().unwrap_or(false)
    }

    /// Returns the number of selected particles.
    pub fn count(&self) -> usize {
        self.members.iter().filter(|&&m| m).count()
    }

    /// Returns the indices of the selected particles in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }

    /// Returns a scalar field holding 1 for selected and 0 for other particles.
    pub fn to_scalar_field(&self) -> ScalarField {
        ScalarField::from_values(
            self.tag,
            self.members
                .iter()
                .map(|&m| if m { 1.0 } else { 0.0 })
                .collect(),
        )
    }
}
