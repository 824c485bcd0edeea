use crate::core::fields::scalar::ScalarField;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use crate::engine::friction::FrictionField;
use std::f64::consts::PI;
use tracing::{debug, instrument};

/// Radius in nm of the sphere over which the local mass density is taken.
pub const SHELL_RADIUS: f64 = 1.5;

/// Fitted parameter sets for the C-alpha friction model.
///
/// Each set maps the local mass density `d` (in g/mol per nm³) linearly to a
/// friction constant `slope * d + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrictionSet {
    /// Linear fit to the initial slope.
    InitialSlope,
    /// Exponential fit over 400 steps.
    #[default]
    Exponential400,
    /// Exponential fit over 200 steps.
    Exponential200,
    /// Expansion fit over 50 steps.
    Expansion50,
}

impl FrictionSet {
    /// Looks up a parameter set by its conventional number, 1 to 4.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::InitialSlope),
            2 => Some(Self::Exponential400),
            3 => Some(Self::Exponential200),
            4 => Some(Self::Expansion50),
            _ => None,
        }
    }

    /// Returns `(slope, offset)`.
    fn coefficients(self) -> (f64, f64) {
        match self {
            Self::InitialSlope => (121.2, -8600.0),
            Self::Exponential400 => (68.2, -5160.0),
            Self::Exponential200 => (38.2, -2160.0),
            Self::Expansion50 => (20.4, -500.0),
        }
    }

    pub fn friction_at_density(self, density: f64) -> f64 {
        let (slope, offset) = self.coefficients();
        slope * density + offset
    }
}

/// Returns the mass density within [`SHELL_RADIUS`] around every particle.
pub fn local_mass_densities(structure: &Structure) -> ScalarField {
    let positions = structure.positions();
    let volume = 4.0 * PI * SHELL_RADIUS.powi(3) / 3.0;
    let densities = positions
        .iter()
        .map(|center| {
            let mass: f64 = structure
                .particles()
                .iter()
                .zip(&positions)
                .filter(|(_, p)| (*p - center).norm() <= SHELL_RADIUS)
                .map(|(particle, _)| particle.mass)
                .sum();
            mass / volume
        })
        .collect();
    ScalarField::from_values(structure.tag(), densities)
}

/// Estimates friction constants for a C-alpha model from local mass density.
///
/// Every particle is treated as a C-alpha site.
///
/// # Errors
///
/// Returns [`EngineError::InvalidFriction`] if a site is so isolated that the
/// fitted formula yields a non-positive friction.
#[instrument(skip_all, name = "calpha_friction")]
pub fn calpha_friction(
    structure: &Structure,
    set: FrictionSet,
) -> Result<FrictionField, EngineError> {
    let densities = local_mass_densities(structure);
    let friction = densities.map(|d| set.friction_at_density(d));
    debug!(
        particles = structure.len(),
        ?set,
        min = ?friction.minimum(),
        max = ?friction.maximum(),
        "Estimated C-alpha friction constants."
    );
    FrictionField::new(friction)
}
