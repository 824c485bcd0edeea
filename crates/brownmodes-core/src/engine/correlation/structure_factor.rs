use super::{
    CorrelationParams, Normalization, SampledFunction, Selection, average_over_directions,
    default_q_range, draw_directions, sample_points,
};
use crate::core::utils::directions::DirectionSampler;
use crate::core::utils::grid::SamplingRange;
use crate::engine::error::EngineError;
use crate::engine::modes::ModeSet;
use nalgebra::{Complex, DMatrix};
use tracing::{debug, instrument};

impl ModeSet {
    /// Computes the static structure factor S(q) averaged over directions.
    ///
    /// Weights default to the coherent scattering lengths and are normalized
    /// to unit Euclidean norm over the subset, so that S(0) = (Σw)² / Σw².
    /// The default wavenumber grid is `[1, 15)` nm⁻¹ in 50 steps.
    #[instrument(skip_all, name = "static_structure_factor")]
    pub fn static_structure_factor(
        &self,
        params: &CorrelationParams,
        q_range: Option<SamplingRange>,
        sampler: &mut dyn DirectionSampler,
    ) -> Result<SampledFunction, EngineError> {
        let selection = Selection::new(
            self,
            params,
            self.structure().coherent_scattering_lengths(),
            Normalization::Norm,
        )?;
        let q = sample_points(q_range.unwrap_or_else(|| default_q_range(1.0)))?;
        let relaxing = self.relaxing_modes(params.first_mode)?;
        let directions = draw_directions(params, sampler)?;
        let kt = self.kt();
        let n = selection.len();

        let values = average_over_directions(&directions, q.len(), |v| {
            // σ_ab = Σ_i (d_b − d_a)² / λ_i at unit wavenumber
            let mut sigma = DMatrix::<f64>::zeros(n, n);
            for (rate, d) in selection.project(self, &relaxing, v) {
                for a in 0..n {
                    for b in (a + 1)..n {
                        sigma[(a, b)] += (d[b] - d[a]).powi(2) / rate;
                    }
                }
            }
            let along = selection.positions_along(self, v);

            q.iter()
                .map(|&q| {
                    let phases: Vec<Complex<f64>> = selection
                        .weights
                        .iter()
                        .zip(&along)
                        .map(|(&w, &x)| Complex::from_polar(w, -q * x))
                        .collect();
                    let mut total: f64 = phases.iter().map(|p| p.norm_sqr()).sum();
                    for a in 0..n {
                        for b in (a + 1)..n {
                            let damping = (-0.5 * kt * q * q * sigma[(a, b)]).exp();
                            total += 2.0 * (phases[b].conj() * phases[a]).re * damping;
                        }
                    }
                    total
                })
                .collect()
        });

        debug!(
            points = q.len(),
            directions = directions.len(),
            "Computed static structure factor."
        );
        SampledFunction::new(q, values)
    }
}
