use super::{
    CorrelationParams, Normalization, SampledFunction, Selection, average_over_directions,
    default_q_range, draw_directions, sample_points,
};
use crate::core::utils::directions::DirectionSampler;
use crate::core::utils::grid::SamplingRange;
use crate::engine::error::EngineError;
use crate::engine::modes::ModeSet;
use tracing::{debug, instrument};

impl ModeSet {
    /// Computes the elastic incoherent structure factor.
    ///
    /// `EISF(q) = ⟨Σ_a w_a exp(−q² v·F_a v)⟩_v`, where `F` is the
    /// [fluctuation tensor](Self::fluctuation_tensor). This is the long-time
    /// limit of the incoherent scattering function. The default grid is
    /// `[0, 15)` nm⁻¹ in 50 steps.
    #[instrument(skip_all, name = "eisf")]
    pub fn eisf(
        &self,
        params: &CorrelationParams,
        q_range: Option<SamplingRange>,
        sampler: &mut dyn DirectionSampler,
    ) -> Result<SampledFunction, EngineError> {
        let selection = Selection::new(
            self,
            params,
            self.incoherent_weights(),
            Normalization::Sum,
        )?;
        let q = sample_points(q_range.unwrap_or_else(|| default_q_range(0.0)))?;
        let fluctuations = self.fluctuation_tensor(params.first_mode)?;
        let directions = draw_directions(params, sampler)?;

        let values = average_over_directions(&directions, q.len(), |v| {
            let spread = fluctuations.quadratic_form(v);
            q.iter()
                .map(|&q| {
                    selection
                        .iter()
                        .map(|(a, w)| w * (-q * q * spread[a]).exp())
                        .sum()
                })
                .collect()
        });

        debug!(
            points = q.len(),
            directions = directions.len(),
            "Computed EISF."
        );
        SampledFunction::new(q, values)
    }
}
