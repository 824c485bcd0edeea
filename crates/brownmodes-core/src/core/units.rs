//! Physical constants and unit factors.
//!
//! Internal units are nm for length, ps for time, g/mol for mass, kJ/mol for
//! energy and K for temperature. Friction coefficients are not mass-weighted;
//! they are quoted with the dimension of an inverse time.

/// Length of a nanometer.
pub const NM: f64 = 1.0;
/// Length of an Ångström.
pub const ANG: f64 = 0.1 * NM;
/// Length of a femtometer (used for scattering lengths).
pub const FM: f64 = 1.0e-6 * NM;
/// Time unit of a picosecond.
pub const PS: f64 = 1.0;
/// Mass unit.
pub const G_PER_MOL: f64 = 1.0;
/// Energy unit.
pub const KJ_PER_MOL: f64 = 1.0;
/// Boltzmann constant in kJ/(mol·K).
pub const K_B: f64 = 0.008_314_462_618_153_24 * KJ_PER_MOL;
