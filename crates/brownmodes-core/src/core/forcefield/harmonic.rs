use super::potentials;
use super::{ForceField, ForceFieldError, ensure_configuration_size};
use crate::core::fields::vector::VectorField;
use crate::core::models::structure::Structure;
use itertools::Itertools;
use nalgebra::{DMatrix, Matrix3, Point3, Vector3};
use nalgebra_sparse::CooMatrix;
use tracing::debug;

/// A harmonic spring between two particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub first: usize,
    pub second: usize,
    /// Force constant in kJ/(mol·nm²).
    pub k: f64,
    /// Rest length in nm.
    pub r0: f64,
}

/// A harmonic restraint of one particle to a fixed point in space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub particle: usize,
    pub center: Point3<f64>,
    pub k: f64,
}

/// A force field made of harmonic springs and anchors.
///
/// Springs produce translation- and rotation-invariant energies, so a network
/// without anchors has six zero-frequency rigid-body modes. Anchors break this
/// invariance and are useful for small test systems with a unique minimum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonicNetwork {
    springs: Vec<Spring>,
    anchors: Vec<Anchor>,
}

impl HarmonicNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an elastic network model over `structure`.
    ///
    /// Every particle pair closer than `cutoff` is connected by a spring of
    /// force constant `k` whose rest length is the current separation, so the
    /// input configuration is an energy minimum.
    pub fn elastic_network(structure: &Structure, cutoff: f64, k: f64) -> Self {
        let positions = structure.positions();
        let springs: Vec<Spring> = (0..positions.len())
            .tuple_combinations()
            .filter_map(|(first, second)| {
                let r0 = (positions[second] - positions[first]).norm();
                (r0 < cutoff).then_some(Spring {
                    first,
                    second,
                    k,
                    r0,
                })
            })
            .collect();
        debug!(
            particles = positions.len(),
            springs = springs.len(),
            cutoff,
            "Built elastic network."
        );
        Self {
            springs,
            anchors: Vec::new(),
        }
    }

    pub fn with_spring(mut self, first: usize, second: usize, k: f64, r0: f64) -> Self {
        self.add_spring(first, second, k, r0);
        self
    }

    pub fn with_anchor(mut self, particle: usize, center: Point3<f64>, k: f64) -> Self {
        self.add_anchor(particle, center, k);
        self
    }

    pub fn add_spring(&mut self, first: usize, second: usize, k: f64, r0: f64) {
        self.springs.push(Spring {
            first,
            second,
            k,
            r0,
        });
    }

    pub fn add_anchor(&mut self, particle: usize, center: Point3<f64>, k: f64) {
        self.anchors.push(Anchor {
            particle,
            center,
            k,
        });
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    fn validate(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<(), ForceFieldError> {
        ensure_configuration_size(structure, configuration)?;
        let len = structure.len();
        let indices = self
            .springs
            .iter()
            .flat_map(|s| [s.first, s.second])
            .chain(self.anchors.iter().map(|a| a.particle));
        for index in indices {
            if index >= len {
                return Err(ForceFieldError::ParticleIndexOutOfRange { index, len });
            }
        }
        Ok(())
    }

    /// Visits the nonzero 3×3 second-derivative blocks `(row, column, block)`.
    ///
    /// Diagonal blocks may be visited several times; callers accumulate.
    fn for_each_block(
        &self,
        configuration: &[Point3<f64>],
        mut visit: impl FnMut(usize, usize, &Matrix3<f64>),
    ) -> Result<(), ForceFieldError> {
        for spring in &self.springs {
            let delta = configuration[spring.second] - configuration[spring.first];
            let block = potentials::spring_hessian_block(&delta, spring.r0, spring.k).ok_or(
                ForceFieldError::DegenerateGeometry {
                    first: spring.first,
                    second: spring.second,
                },
            )?;
            let negative = -block;
            visit(spring.first, spring.first, &block);
            visit(spring.second, spring.second, &block);
            visit(spring.first, spring.second, &negative);
            visit(spring.second, spring.first, &negative);
        }
        for anchor in &self.anchors {
            let block = potentials::anchor_hessian_block(anchor.k);
            visit(anchor.particle, anchor.particle, &block);
        }
        Ok(())
    }
}

impl ForceField for HarmonicNetwork {
    fn energy(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<f64, ForceFieldError> {
        self.validate(structure, configuration)?;
        let springs: f64 = self
            .springs
            .iter()
            .map(|s| {
                let dist = (configuration[s.second] - configuration[s.first]).norm();
                potentials::harmonic(dist, s.r0, s.k)
            })
            .sum();
        let anchors: f64 = self
            .anchors
            .iter()
            .map(|a| potentials::anchor(&(configuration[a.particle] - a.center), a.k))
            .sum();
        Ok(springs + anchors)
    }

    fn gradient(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<VectorField, ForceFieldError> {
        self.validate(structure, configuration)?;
        let mut values = vec![Vector3::zeros(); structure.len()];
        for spring in &self.springs {
            let delta = configuration[spring.second] - configuration[spring.first];
            let g = potentials::spring_gradient(&delta, spring.r0, spring.k).ok_or(
                ForceFieldError::DegenerateGeometry {
                    first: spring.first,
                    second: spring.second,
                },
            )?;
            values[spring.second] += g;
            values[spring.first] -= g;
        }
        for anchor in &self.anchors {
            let offset = configuration[anchor.particle] - anchor.center;
            values[anchor.particle] += potentials::anchor_gradient(&offset, anchor.k);
        }
        Ok(VectorField::from_values(structure.tag(), values))
    }

    fn force_constants(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<DMatrix<f64>, ForceFieldError> {
        self.validate(structure, configuration)?;
        let n = 3 * structure.len();
        let mut matrix = DMatrix::zeros(n, n);
        self.for_each_block(configuration, |row, column, block| {
            let mut target = matrix.fixed_view_mut::<3, 3>(3 * row, 3 * column);
            target += block;
        })?;
        Ok(matrix)
    }

    fn sparse_force_constants(
        &self,
        structure: &Structure,
        configuration: &[Point3<f64>],
    ) -> Result<CooMatrix<f64>, ForceFieldError> {
        self.validate(structure, configuration)?;
        let n = 3 * structure.len();
        let mut matrix = CooMatrix::new(n, n);
        self.for_each_block(configuration, |row, column, block| {
            for (i, j) in (0..3).cartesian_product(0..3) {
                let value = block[(i, j)];
                if value != 0.0 {
                    matrix.push(3 * row + i, 3 * column + j, value);
                }
            }
        })?;
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use nalgebra_sparse::CsrMatrix;

    const TOLERANCE: f64 = 1e-9;

    fn dimer(separation: f64) -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::origin(), 1.0),
            Particle::new("B", Point3::new(separation, 0.0, 0.0), 1.0),
        ])
    }

    fn triangle() -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::new(0.0, 0.0, 0.0), 1.0),
            Particle::new("B", Point3::new(0.4, 0.0, 0.0), 1.0),
            Particle::new("C", Point3::new(0.1, 0.35, 0.05), 1.0),
        ])
    }

    #[test]
    fn elastic_network_connects_pairs_within_cutoff() {
        let s = Structure::new(vec![
            Particle::new("A", Point3::new(0.0, 0.0, 0.0), 1.0),
            Particle::new("B", Point3::new(0.5, 0.0, 0.0), 1.0),
            Particle::new("C", Point3::new(2.0, 0.0, 0.0), 1.0),
        ]);
        let network = HarmonicNetwork::elastic_network(&s, 1.0, 10.0);
        assert_eq!(network.springs().len(), 1);
        assert_eq!(network.springs()[0].first, 0);
        assert_eq!(network.springs()[0].second, 1);
        assert!((network.springs()[0].r0 - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn elastic_network_has_zero_energy_and_gradient_at_reference() {
        let s = triangle();
        let network = HarmonicNetwork::elastic_network(&s, 1.0, 50.0);
        let positions = s.positions();
        assert!(network.energy(&s, &positions).unwrap().abs() < TOLERANCE);
        assert!(network.gradient(&s, &positions).unwrap().norm() < TOLERANCE);
    }

    #[test]
    fn gradient_sums_to_zero_without_anchors() {
        let s = triangle();
        let network = HarmonicNetwork::new()
            .with_spring(0, 1, 3.0, 0.2)
            .with_spring(1, 2, 5.0, 0.6);
        let gradient = network.gradient(&s, &s.positions()).unwrap();
        assert!(gradient.sum_over_particles().norm() < TOLERANCE);
    }

    #[test]
    fn force_constants_are_symmetric_with_zero_row_sums() {
        let s = triangle();
        let network = HarmonicNetwork::elastic_network(&s, 1.0, 50.0);
        let h = network.force_constants(&s, &s.positions()).unwrap();
        assert_eq!(h.nrows(), 9);
        assert!((&h - h.transpose()).norm() < TOLERANCE);
        for row in h.row_iter() {
            let sums: f64 = (0..3).map(|c| row[c] + row[3 + c] + row[6 + c]).sum();
            assert!(sums.abs() < TOLERANCE);
        }
    }

    #[test]
    fn sparse_force_constants_match_dense() {
        let s = triangle();
        let network = HarmonicNetwork::elastic_network(&s, 1.0, 50.0)
            .with_anchor(2, Point3::new(0.0, 0.0, 1.0), 7.0);
        let dense = network.force_constants(&s, &s.positions()).unwrap();
        let sparse = network.sparse_force_constants(&s, &s.positions()).unwrap();
        let csr = CsrMatrix::from(&sparse);
        let densified = DMatrix::from(&csr);
        assert!((dense - densified).norm() < TOLERANCE);
    }

    #[test]
    fn anchored_particle_gradient_points_away_from_center() {
        let s = dimer(1.0);
        let network = HarmonicNetwork::new().with_anchor(1, Point3::origin(), 2.0);
        let gradient = network.gradient(&s, &s.positions()).unwrap();
        assert_eq!(gradient[1], Vector3::new(2.0, 0.0, 0.0));
        assert!((network.energy(&s, &s.positions()).unwrap() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn out_of_range_spring_is_rejected() {
        let s = dimer(1.0);
        let network = HarmonicNetwork::new().with_spring(0, 5, 1.0, 1.0);
        assert_eq!(
            network.energy(&s, &s.positions()),
            Err(ForceFieldError::ParticleIndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn wrong_configuration_length_is_rejected() {
        let s = dimer(1.0);
        let network = HarmonicNetwork::new().with_spring(0, 1, 1.0, 1.0);
        assert!(matches!(
            network.gradient(&s, &[Point3::origin()]),
            Err(ForceFieldError::SizeMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn coincident_particles_give_degenerate_geometry() {
        let s = dimer(0.0);
        let network = HarmonicNetwork::new().with_spring(0, 1, 1.0, 1.0);
        assert_eq!(
            network.force_constants(&s, &s.positions()),
            Err(ForceFieldError::DegenerateGeometry {
                first: 0,
                second: 1
            })
        );
    }
}
