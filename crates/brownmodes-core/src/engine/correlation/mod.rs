//! Thermal correlation functions computed from a [`ModeSet`].
//!
//! In the overdamped harmonic picture every relaxation mode decays
//! exponentially with its inverse relaxation time λ, so time correlation
//! functions reduce to sums over modes. The functions here are methods on
//! [`ModeSet`]:
//!
//! - [`mean_square_displacement`](ModeSet::mean_square_displacement)
//! - [`static_structure_factor`](ModeSet::static_structure_factor)
//! - [`coherent_scattering_function`](ModeSet::coherent_scattering_function)
//! - [`incoherent_scattering_function`](ModeSet::incoherent_scattering_function)
//! - [`eisf`](ModeSet::eisf)
//!
//! Scattering functions depend on the direction of the scattering vector and
//! are averaged over directions drawn from a caller-supplied
//! [`DirectionSampler`]. All directions are drawn before any work starts; with
//! the `parallel` feature the per-direction contributions are evaluated on the
//! rayon pool and summed in draw order.
//!
//! The coherent functions cost O(directions × modes × particles²), the
//! incoherent ones O(directions × modes × particles).

mod coherent;
mod eisf;
mod incoherent;
mod msd;
pub mod params;
pub mod sampled;
mod structure_factor;

pub use params::CorrelationParams;
pub use sampled::{ExportError, SampledFunction};

use super::error::EngineError;
use super::modes::ModeSet;
use crate::core::fields::scalar::ScalarField;
use crate::core::utils::directions::DirectionSampler;
use crate::core::utils::grid::SamplingRange;
use nalgebra::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const DEFAULT_TIME_POINTS: usize = 300;
const DEFAULT_Q_POINTS: usize = 50;
/// Default upper end of wavenumber grids, in 1/nm.
const DEFAULT_Q_MAX: f64 = 15.0;
/// Default time grids cover this many slowest relaxation times.
const SPANNED_RELAXATION_TIMES: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
enum Normalization {
    /// Weights sum to one.
    Sum,
    /// Weights have unit Euclidean norm.
    Norm,
}

/// The particles taking part in an average, with normalized weights.
#[derive(Debug, Clone)]
struct Selection {
    indices: Vec<usize>,
    weights: Vec<f64>,
}

impl Selection {
    fn new(
        modes: &ModeSet,
        params: &CorrelationParams,
        default_weights: ScalarField,
        normalization: Normalization,
    ) -> Result<Self, EngineError> {
        let tag = modes.tag();
        let weights = match &params.weights {
            Some(weights) => {
                tag.ensure_compatible(&weights.tag())?;
                weights
            }
            None => &default_weights,
        };
        let indices = match &params.subset {
            Some(mask) => {
                tag.ensure_compatible(&mask.tag())?;
                mask.indices()
            }
            None => (0..tag.len).collect(),
        };

        let raw: Vec<f64> = indices.iter().map(|&i| weights[i]).collect();
        let total = match normalization {
            Normalization::Sum => raw.iter().sum::<f64>(),
            Normalization::Norm => raw.iter().map(|w| w * w).sum::<f64>().sqrt(),
        };
        if indices.is_empty() || total == 0.0 || !total.is_finite() {
            return Err(EngineError::EmptySubset);
        }
        Ok(Self {
            indices,
            weights: raw.iter().map(|w| w / total).collect(),
        })
    }

    fn len(&self) -> usize {
        self.indices.len()
    }

    fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.weights.iter().copied())
    }

    /// Returns `r_a·v` for every selected particle.
    fn positions_along(&self, modes: &ModeSet, v: &Vector3<f64>) -> Vec<f64> {
        let particles = modes.structure().particles();
        self.indices
            .iter()
            .map(|&a| particles[a].position.coords.dot(v))
            .collect()
    }

    /// Returns `(λ_i, (raw_i[a]·v)/√γ_a)` over the selected particles for each mode.
    fn project(
        &self,
        modes: &ModeSet,
        relaxing: &[(f64, Vec<Vector3<f64>>)],
        v: &Vector3<f64>,
    ) -> Vec<(f64, Vec<f64>)> {
        let sqrt_friction = modes.sqrt_friction();
        relaxing
            .iter()
            .map(|(rate, raw)| {
                let d = self
                    .indices
                    .iter()
                    .map(|&a| raw[a].dot(v) / sqrt_friction[a])
                    .collect();
                (*rate, d)
            })
            .collect()
    }
}

fn draw_directions(
    params: &CorrelationParams,
    sampler: &mut dyn DirectionSampler,
) -> Result<Vec<Vector3<f64>>, EngineError> {
    if params.directions == 0 {
        return Err(EngineError::InvalidParameter(
            "at least one direction is needed for the orientational average".to_string(),
        ));
    }
    Ok(sampler.sample_many(params.directions))
}

fn sample_points(range: SamplingRange) -> Result<Vec<f64>, EngineError> {
    range
        .points()
        .map_err(|e| EngineError::InvalidParameter(e.to_string()))
}

/// `[0, 3/λ_first)` in 300 steps.
fn default_time_range(modes: &ModeSet, first_mode: usize) -> Result<SamplingRange, EngineError> {
    let rate = modes.inv_relaxation_time(first_mode).map_err(|_| {
        EngineError::InvalidParameter(format!(
            "first_mode {first_mode} leaves no mode to derive a time range from ({} modes)",
            modes.len()
        ))
    })?;
    if rate <= 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "mode {first_mode} has zero inverse relaxation time; a time range must be given"
        )));
    }
    Ok(SamplingRange::with_divisions(
        0.0,
        SPANNED_RELAXATION_TIMES / rate,
        DEFAULT_TIME_POINTS,
    ))
}

fn default_q_range(first: f64) -> SamplingRange {
    SamplingRange::with_divisions(first, DEFAULT_Q_MAX, DEFAULT_Q_POINTS)
}

/// Averages `contribution(v)` over all directions.
fn average_over_directions<F>(
    directions: &[Vector3<f64>],
    points: usize,
    contribution: F,
) -> Vec<f64>
where
    F: Fn(&Vector3<f64>) -> Vec<f64> + Sync + Send,
{
    #[cfg(not(feature = "parallel"))]
    let iterator = directions.iter();

    #[cfg(feature = "parallel")]
    let iterator = directions.par_iter();

    let contributions: Vec<Vec<f64>> = iterator.map(contribution).collect();

    let mut total = vec![0.0; points];
    for values in contributions {
        for (sum, value) in total.iter_mut().zip(values) {
            *sum += value;
        }
    }
    let count = directions.len() as f64;
    total.iter_mut().for_each(|sum| *sum /= count);
    total
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::core::forcefield::harmonic::HarmonicNetwork;
    use crate::core::models::particle::Particle;
    use crate::core::models::structure::Structure;
    use crate::engine::config::{ModeConfig, Temperature};
    use crate::engine::force_constants;
    use crate::engine::friction::FrictionField;
    use crate::engine::modes::ModeSet;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::solver;
    use nalgebra::Point3;

    /// Five particles connected by an elastic network, with scattering lengths.
    pub fn pentamer() -> Structure {
        let coordinates = [
            [0.0, 0.0, 0.0],
            [0.38, 0.0, 0.0],
            [0.5, 0.36, 0.0],
            [0.2, 0.55, 0.12],
            [-0.1, 0.3, 0.31],
        ];
        Structure::new(
            coordinates
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let i = i as f64;
                    Particle::new("CA", Point3::new(c[0], c[1], c[2]), 12.0 + i)
                        .with_scattering_lengths(6.6e-6 + 1e-7 * i, 2.5e-5 * (1.0 + i))
                })
                .collect(),
        )
    }

    pub fn modes_with(temperature: Temperature) -> ModeSet {
        let structure = pentamer();
        let network = HarmonicNetwork::elastic_network(&structure, 1.0, 500.0);
        let friction = FrictionField::new(
            crate::core::fields::scalar::ScalarField::new(
                &structure,
                vec![5000.0, 6000.0, 5500.0, 7000.0, 4500.0],
            )
            .unwrap(),
        )
        .unwrap();
        let config = ModeConfig {
            temperature,
            ..ModeConfig::default()
        };
        let weighted = force_constants::build(
            &structure,
            &network,
            &friction,
            &config,
            &ProgressReporter::new(),
        )
        .unwrap();
        let eigensystem = solver::solve(weighted, config.negative_eigenvalue_tolerance, 0).unwrap();
        ModeSet::new(structure, friction, temperature, eigensystem)
    }

    pub fn modes() -> ModeSet {
        modes_with(Temperature::default())
    }
}
