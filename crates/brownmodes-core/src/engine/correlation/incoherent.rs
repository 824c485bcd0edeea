use super::{
    CorrelationParams, Normalization, SampledFunction, Selection, average_over_directions,
    default_time_range, draw_directions, sample_points,
};
use crate::core::fields::scalar::ScalarField;
use crate::core::utils::directions::DirectionSampler;
use crate::core::utils::grid::SamplingRange;
use crate::engine::error::EngineError;
use crate::engine::modes::ModeSet;
use tracing::{debug, instrument};

impl ModeSet {
    /// Returns `b_inc²` per particle, the default incoherent weighting.
    pub(super) fn incoherent_weights(&self) -> ScalarField {
        self.structure()
            .incoherent_scattering_lengths()
            .map(|b| b * b)
    }

    /// Computes the incoherent intermediate scattering function F_inc(q, t).
    ///
    /// `F_inc = ⟨Σ_a w_a exp(kT Σ_i d_a² (e^{−λ_i t} − 1)/λ_i)⟩_v` with
    /// `d_a = q (raw_i[a]·v)/√γ_a`. Weights default to `b_inc²` and are
    /// normalized to sum one, so `F_inc(q, 0) = 1`.
    #[instrument(skip_all, name = "incoherent_scattering_function")]
    pub fn incoherent_scattering_function(
        &self,
        q: f64,
        params: &CorrelationParams,
        time_range: Option<SamplingRange>,
        sampler: &mut dyn DirectionSampler,
    ) -> Result<SampledFunction, EngineError> {
        let selection = Selection::new(
            self,
            params,
            self.incoherent_weights(),
            Normalization::Sum,
        )?;
        let range = match time_range {
            Some(range) => range,
            None => default_time_range(self, params.first_mode)?,
        };
        let time = sample_points(range)?;
        let relaxing = self.relaxing_modes(params.first_mode)?;
        let directions = draw_directions(params, sampler)?;
        let kt = self.kt();

        let values = average_over_directions(&directions, time.len(), |v| {
            let projected = selection.project(self, &relaxing, v);
            time.iter()
                .map(|&t| {
                    selection
                        .weights
                        .iter()
                        .enumerate()
                        .map(|(a, w)| {
                            let exponent: f64 = projected
                                .iter()
                                .map(|(rate, d)| {
                                    (q * d[a]).powi(2) * ((-rate * t).exp() - 1.0) / rate
                                })
                                .sum();
                            w * (kt * exponent).exp()
                        })
                        .sum()
                })
                .collect()
        });

        debug!(
            q,
            points = time.len(),
            directions = directions.len(),
            "Computed incoherent scattering function."
        );
        SampledFunction::new(time, values)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::modes;
    use super::*;
    use crate::core::fields::mask::ParticleMask;
    use crate::core::utils::directions::{FixedDirections, RandomDirections};

    #[test]
    fn incoherent_function_starts_at_one() {
        let modes = modes();
        let params = CorrelationParams::new().with_directions(7);
        let finc = modes
            .incoherent_scattering_function(12.0, &params, None, &mut RandomDirections::seeded(9))
            .unwrap();
        assert!((finc.values()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn incoherent_function_decreases_monotonically() {
        let modes = modes();
        let params = CorrelationParams::new().with_directions(3);
        let finc = modes
            .incoherent_scattering_function(12.0, &params, None, &mut FixedDirections::axes())
            .unwrap();
        assert!(finc.values().windows(2).all(|w| w[1] <= w[0]));
        assert!(*finc.values().last().unwrap() < 1.0);
    }

    #[test]
    fn explicit_weights_replace_scattering_lengths() {
        let modes = modes();
        let subset = ParticleMask::from_indices(modes.structure(), [0]).unwrap();
        let by_subset = CorrelationParams::new()
            .with_subset(subset)
            .with_directions(3);
        let mut weights = ScalarField::zeros(modes.structure());
        weights.set(0, 1.0).unwrap();
        let by_weights = CorrelationParams::new()
            .with_weights(weights)
            .with_directions(3);

        let range = Some(SamplingRange::new(0.0, 20.0, 2.0));
        let a = modes
            .incoherent_scattering_function(8.0, &by_subset, range, &mut FixedDirections::axes())
            .unwrap();
        let b = modes
            .incoherent_scattering_function(8.0, &by_weights, range, &mut FixedDirections::axes())
            .unwrap();
        for (x, y) in a.values().iter().zip(b.values()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn spring_dimer_starts_at_one_and_decays() {
        use crate::core::forcefield::harmonic::HarmonicNetwork;
        use crate::core::models::particle::Particle;
        use crate::core::models::structure::Structure;
        use crate::engine::config::ModeConfig;
        use crate::engine::friction::FrictionField;
        use crate::engine::progress::ProgressReporter;
        use crate::workflows::brownian;
        use nalgebra::Point3;

        let s = Structure::new(vec![
            Particle::new("A", Point3::origin(), 12.0).with_scattering_lengths(6.6e-6, 2.5e-5),
            Particle::new("B", Point3::new(0.38, 0.0, 0.0), 12.0)
                .with_scattering_lengths(6.6e-6, 2.5e-5),
        ]);
        let network = HarmonicNetwork::new().with_spring(0, 1, 400.0, 0.38);
        let modes = brownian::run(
            &s,
            &network,
            FrictionField::uniform(&s, 5000.0).unwrap(),
            &ModeConfig::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        let params = CorrelationParams::new().with_first_mode(5).with_directions(3);
        let finc = modes
            .incoherent_scattering_function(10.0, &params, None, &mut FixedDirections::axes())
            .unwrap();
        assert!((finc.values()[0] - 1.0).abs() < 1e-12);
        assert!(finc.values().windows(2).all(|w| w[1] <= w[0] + 1e-15));
    }
}
