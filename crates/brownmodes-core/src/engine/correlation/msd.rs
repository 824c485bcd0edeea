use super::{
    CorrelationParams, Normalization, SampledFunction, Selection, default_time_range,
    sample_points,
};
use crate::core::utils::grid::SamplingRange;
use crate::engine::error::EngineError;
use crate::engine::modes::ModeSet;
use tracing::{debug, instrument};

impl ModeSet {
    /// Computes the weighted mean-square displacement as a function of time.
    ///
    /// `msd(t) = 2kT Σ_i D_i (1 − e^{−λ_i t}) / λ_i` with
    /// `D_i = Σ_a w_a |raw_i[a]|² / γ_a`. Weights default to the particle masses
    /// and are normalized to sum one over the subset. Without an explicit
    /// `time_range` the grid is `[0, 3/λ_first_mode)` in 300 steps.
    #[instrument(skip_all, name = "mean_square_displacement")]
    pub fn mean_square_displacement(
        &self,
        params: &CorrelationParams,
        time_range: Option<SamplingRange>,
    ) -> Result<SampledFunction, EngineError> {
        let selection = Selection::new(
            self,
            params,
            self.structure().masses(),
            Normalization::Sum,
        )?;
        let range = match time_range {
            Some(range) => range,
            None => default_time_range(self, params.first_mode)?,
        };
        let time = sample_points(range)?;
        let friction = self.friction().values();

        let mut msd = vec![0.0; time.len()];
        for (rate, raw) in self.relaxing_modes(params.first_mode)? {
            let d: f64 = selection
                .iter()
                .map(|(a, w)| w * raw[a].norm_squared() / friction[a])
                .sum();
            for (value, &t) in msd.iter_mut().zip(&time) {
                *value += d * (1.0 - (-rate * t).exp()) / rate;
            }
        }
        let scale = 2.0 * self.kt();
        msd.iter_mut().for_each(|value| *value *= scale);

        debug!(
            points = time.len(),
            particles = selection.len(),
            "Computed mean-square displacement."
        );
        SampledFunction::new(time, msd)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::modes;
    use super::*;
    use crate::core::fields::mask::ParticleMask;
    use crate::core::forcefield::harmonic::HarmonicNetwork;
    use crate::core::models::particle::Particle;
    use crate::core::models::structure::Structure;
    use crate::engine::config::{ModeConfig, Temperature};
    use crate::engine::force_constants;
    use crate::engine::friction::FrictionField;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::solver;
    use nalgebra::Point3;

    #[test]
    fn msd_starts_at_zero_and_grows() {
        let modes = modes();
        let msd = modes
            .mean_square_displacement(&CorrelationParams::new(), None)
            .unwrap();
        assert_eq!(msd.len(), 300);
        assert_eq!(msd.values()[0], 0.0);
        assert!(msd.values().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn msd_approaches_fluctuation_average_at_long_times() {
        let modes = modes();
        let params = CorrelationParams::new();
        let msd = modes
            .mean_square_displacement(&params, Some(SamplingRange::new(1e9, 2e9, 1e9)))
            .unwrap();

        let fluctuations = modes.fluctuations(6).unwrap();
        let masses = modes.structure().masses();
        let expected = 2.0 * masses.weighted_by(&fluctuations).unwrap().sum_over_particles()
            / masses.sum_over_particles();
        assert!((msd.values()[0] - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn anchored_particle_relaxes_exponentially() {
        let k = 200.0;
        let gamma = 50.0;
        let structure = Structure::new(vec![Particle::new("A", Point3::new(0.1, 0.2, 0.3), 12.0)]);
        let network = HarmonicNetwork::new().with_anchor(0, Point3::new(0.1, 0.2, 0.3), k);
        let friction = FrictionField::uniform(&structure, gamma).unwrap();
        let config = ModeConfig {
            temperature: Temperature::Unscaled,
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
        let eigensystem = solver::solve(weighted, 1e-8, 0).unwrap();
        let modes = ModeSet::new(structure, friction, Temperature::Unscaled, eigensystem);

        let params = CorrelationParams::new().with_first_mode(0);
        let msd = modes.mean_square_displacement(&params, None).unwrap();
        let rate = k / gamma;
        for (t, value) in msd.points() {
            let expected = 6.0 / k * (1.0 - (-rate * t).exp());
            assert!((value - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn msd_on_subset_uses_only_selected_particles() {
        let modes = modes();
        let range = SamplingRange::new(0.0, 10.0, 1.0);
        let single = CorrelationParams::new()
            .with_subset(ParticleMask::from_indices(modes.structure(), [2]).unwrap());
        let msd = modes.mean_square_displacement(&single, Some(range)).unwrap();
        let expected = 2.0 * modes.fluctuations(6).unwrap()[2];
        let last = *msd.values().last().unwrap();
        assert!(last > 0.0 && last < expected);
    }
}
