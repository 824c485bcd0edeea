use super::particle::Particle;
use crate::core::fields::error::FieldError;
use crate::core::fields::scalar::ScalarField;
use crate::core::fields::vector::VectorField;
use nalgebra::{Point3, Vector3};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STRUCTURE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a [`Structure`].
///
/// Two structures created independently never share an identity, even if
/// their particles are identical. Clones share the identity of their source
/// until either one changes its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(u64);

impl StructureId {
    fn next() -> Self {
        Self(NEXT_STRUCTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The compatibility stamp carried by every particle field.
///
/// A tag records which structure a field belongs to, the configuration
/// version of that structure when the field was created, and the particle
/// count. Binary field operations require equal tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotTag {
    /// The identity of the structure.
    pub structure: StructureId,
    /// The configuration version.
    pub version: u64,
    /// The number of particles.
    pub len: usize,
}

impl SnapshotTag {
    /// Verifies that `other` refers to the same structure at the same version.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::IncompatibleUniverse`] if the structures differ and
    /// [`FieldError::StaleVersion`] if only the versions differ.
    pub fn ensure_compatible(&self, other: &SnapshotTag) -> Result<(), FieldError> {
        if self.structure != other.structure {
            return Err(FieldError::IncompatibleUniverse);
        }
        if self.version != other.version {
            return Err(FieldError::StaleVersion {
                expected: self.version,
                found: other.version,
            });
        }
        Ok(())
    }
}

/// A fixed set of particles together with their current configuration.
///
/// This struct is the snapshot that all particle fields are defined over.
/// The particle count never changes after construction. Replacing the
/// configuration stamps a new, globally unique version, which invalidates
/// every field created before the change, including fields of clones.
#[derive(Debug, Clone)]
pub struct Structure {
    /// The identity shared by all clones of this structure.
    id: StructureId,
    /// The configuration version, unique across all configuration changes.
    version: u64,
    /// The particles in index order.
    particles: Vec<Particle>,
}

impl Structure {
    /// Creates a new structure from the given particles.
    ///
    /// The structure receives a fresh identity and version 0.
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            id: StructureId::next(),
            version: 0,
            particles,
        }
    }

    /// Returns the identity of this structure.
    pub fn id(&self) -> StructureId {
        self.id
    }

    /// Returns the configuration version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the compatibility tag of the current snapshot.
    pub fn tag(&self) -> SnapshotTag {
        SnapshotTag {
            structure: self.id,
            version: self.version,
            len: self.particles.len(),
        }
    }

    /// Returns the number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Returns `true` if the structure contains no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Returns all particles in index order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Retrieves a particle by index.
    ///
    /// # Return
    ///
    /// Returns `Some(&Particle)` if the index is valid, otherwise `None`.
    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Returns the current positions of all particles.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// Returns the configuration as a vector field of positions.
    pub fn configuration(&self) -> VectorField {
        VectorField::from_values(
            self.tag(),
            self.particles.iter().map(|p| p.position.coords).collect(),
        )
    }

    /// Returns the particle masses as a scalar field.
    pub fn masses(&self) -> ScalarField {
        ScalarField::from_values(self.tag(), self.particles.iter().map(|p| p.mass).collect())
    }

    /// Returns the coherent scattering lengths as a scalar field.
    pub fn coherent_scattering_lengths(&self) -> ScalarField {
        ScalarField::from_values(
            self.tag(),
            self.particles.iter().map(|p| p.b_coherent).collect(),
        )
    }

    /// Returns the incoherent scattering lengths as a scalar field.
    pub fn incoherent_scattering_lengths(&self) -> ScalarField {
        ScalarField::from_values(
            self.tag(),
            self.particles.iter().map(|p| p.b_incoherent).collect(),
        )
    }

    /// Returns the total mass of all particles.
    pub fn total_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Returns the mass-weighted centre of the structure.
    ///
    /// For a structure with zero total mass the geometric centre is returned.
    pub fn center_of_mass(&self) -> Point3<f64> {
        let total = self.total_mass();
        if self.particles.is_empty() {
            return Point3::origin();
        }
        let sum = if total > 0.0 {
            self.particles
                .iter()
                .fold(Vector3::zeros(), |acc, p| acc + p.position.coords * p.mass)
                / total
        } else {
            self.particles
                .iter()
                .fold(Vector3::zeros(), |acc, p| acc + p.position.coords)
                / self.particles.len() as f64
        };
        Point3::from(sum)
    }

    /// Replaces the positions of all particles and stamps a new version.
    ///
    /// Versions are drawn from a process-wide counter, so two clones moved to
    /// different configurations never share a version.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the number of positions differs
    /// from the number of particles. The structure is left unchanged.
    pub fn set_configuration(&mut self, positions: &[Point3<f64>]) -> Result<(), FieldError> {
        if positions.len() != self.particles.len() {
            return Err(FieldError::SizeMismatch {
                expected: self.particles.len(),
                found: positions.len(),
            });
        }
        for (particle, position) in self.particles.iter_mut().zip(positions) {
            particle.position = *position;
        }
        self.version = NEXT_VERSION.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
