use crate::core::fields::mask::ParticleMask;
use crate::core::fields::scalar::ScalarField;
use crate::core::utils::directions::RandomDirections;
use crate::engine::config::CorrelationSettings;
use rand::rngs::StdRng;

pub const DEFAULT_FIRST_MODE: usize = 6;
pub const DEFAULT_DIRECTIONS: usize = 15;

/// Parameters shared by all correlation functions.
///
/// `first_mode` skips the rigid-body modes of a free molecule. A `subset`
/// restricts the average to some particles; without one every particle takes
/// part. `weights`, when given, replace the default weighting of the function
/// being evaluated before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationParams {
    pub first_mode: usize,
    pub subset: Option<ParticleMask>,
    pub weights: Option<ScalarField>,
    /// Number of directions in the orientational average.
    pub directions: usize,
}

impl Default for CorrelationParams {
    fn default() -> Self {
        Self {
            first_mode: DEFAULT_FIRST_MODE,
            subset: None,
            weights: None,
            directions: DEFAULT_DIRECTIONS,
        }
    }
}

impl CorrelationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_mode(mut self, first_mode: usize) -> Self {
        self.first_mode = first_mode;
        self
    }

    pub fn with_subset(mut self, subset: ParticleMask) -> Self {
        self.subset = Some(subset);
        self
    }

    pub fn with_weights(mut self, weights: ScalarField) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_directions(mut self, directions: usize) -> Self {
        self.directions = directions;
        self
    }

    /// Takes `first_mode` and `directions` from file settings.
    pub fn from_settings(settings: &CorrelationSettings) -> Self {
        Self::default()
            .with_first_mode(settings.first_mode)
            .with_directions(settings.directions)
    }
}

impl CorrelationSettings {
    /// Returns a direction sampler, reproducible when a seed is configured.
    pub fn sampler(&self) -> RandomDirections<StdRng> {
        match self.seed {
            Some(seed) => RandomDirections::seeded(seed),
            None => RandomDirections::from_entropy(),
        }
    }
}
