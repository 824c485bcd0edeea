use super::{
    CorrelationParams, Normalization, SampledFunction, Selection, average_over_directions,
    default_time_range, draw_directions, sample_points,
};
use crate::core::utils::directions::DirectionSampler;
use crate::core::utils::grid::SamplingRange;
use crate::engine::error::EngineError;
use crate::engine::modes::ModeSet;
use nalgebra::{Complex, DMatrix, DVector};
use tracing::{debug, instrument};

impl ModeSet {
    /// Computes the coherent intermediate scattering function F_coh(q, t).
    ///
    /// For each direction `v` and particle pair the exponent is
    /// `φ_ab(t) = Σ_i [d_a d_b e^{−λ_i t} − ½(d_a² + d_b²)] / λ_i` with
    /// `d_a = q (raw_i[a]·v)/√γ_a`. Weights are handled as in
    /// [`static_structure_factor`](Self::static_structure_factor), so that
    /// `F_coh(q, 0) = S(q)` for the same directions.
    #[instrument(skip_all, name = "coherent_scattering_function")]
    pub fn coherent_scattering_function(
        &self,
        q: f64,
        params: &CorrelationParams,
        time_range: Option<SamplingRange>,
        sampler: &mut dyn DirectionSampler,
    ) -> Result<SampledFunction, EngineError> {
        let selection = Selection::new(
            self,
            params,
            self.structure().coherent_scattering_lengths(),
            Normalization::Norm,
        )?;
        let range = match time_range {
            Some(range) => range,
            None => default_time_range(self, params.first_mode)?,
        };
        let time = sample_points(range)?;
        let relaxing = self.relaxing_modes(params.first_mode)?;
        let directions = draw_directions(params, sampler)?;
        let kt = self.kt();
        let n = selection.len();
        let rates = DVector::from_iterator(relaxing.len(), relaxing.iter().map(|(rate, _)| *rate));

        let values = average_over_directions(&directions, time.len(), |v| {
            let projected = selection.project(self, &relaxing, v);
            // rows: selected particles, columns: modes
            let d = DMatrix::from_fn(n, projected.len(), |a, i| q * projected[i].1[a]);
            let statics: Vec<f64> = d
                .row_iter()
                .map(|row| row.iter().zip(rates.iter()).map(|(x, r)| x * x / r).sum())
                .collect();
            let phases: Vec<Complex<f64>> = selection
                .weights
                .iter()
                .zip(selection.positions_along(self, v))
                .map(|(&w, x)| Complex::from_polar(w, -q * x))
                .collect();

            time.iter()
                .map(|&t| {
                    let decay = rates.map(|r| (-r * t).exp() / r);
                    let mut scaled = d.clone();
                    for (mut column, factor) in scaled.column_iter_mut().zip(decay.iter()) {
                        column *= *factor;
                    }
                    let dynamic = scaled * d.transpose();

                    let mut total = 0.0;
                    for a in 0..n {
                        total += phases[a].norm_sqr() * (kt * (dynamic[(a, a)] - statics[a])).exp();
                        for b in (a + 1)..n {
                            let exponent = dynamic[(a, b)] - 0.5 * (statics[a] + statics[b]);
                            let phase = (phases[a] * phases[b].conj()).re;
                            total += 2.0 * phase * (kt * exponent).exp();
                        }
                    }
                    total
                })
                .collect()
        });

        debug!(
            q,
            points = time.len(),
            directions = directions.len(),
            "Computed coherent scattering function."
        );
        SampledFunction::new(time, values)
    }
}
