use super::{ForceField, ForceFieldError, ensure_configuration_size};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use tracing::debug;

/// The outcome of comparing analytic derivatives with finite differences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeReport {
    /// The largest absolute deviation over all compared components.
    pub max_deviation: f64,
    /// The largest absolute value among the analytic components.
    pub max_magnitude: f64,
    /// The flat index of the component with the largest deviation.
    pub worst_component: usize,
}

impl DerivativeReport {
    fn new() -> Self {
        Self {
            max_deviation: 0.0,
            max_magnitude: 0.0,
            worst_component: 0,
        }
    }

    fn record(&mut self, component: usize, analytic: f64, numeric: f64) {
        let deviation = (analytic - numeric).abs();
        if deviation > self.max_deviation {
            self.max_deviation = deviation;
            self.worst_component = component;
        }
        self.max_magnitude = self.max_magnitude.max(analytic.abs());
    }

    /// Returns the largest deviation relative to the largest analytic value.
    pub fn relative_deviation(&self) -> f64 {
        if self.max_magnitude > 0.0 {
            self.max_deviation / self.max_magnitude
        } else {
            self.max_deviation
        }
    }

    pub fn is_within(&self, tolerance: f64) -> bool {
        self.relative_deviation() <= tolerance
    }
}

fn displaced(configuration: &[Point3<f64>], component: usize, step: f64) -> Vec<Point3<f64>> {
    let mut shifted = configuration.to_vec();
    shifted[component / 3][component % 3] += step;
    shifted
}

/// Compares the analytic gradient with central differences of the energy.
pub fn gradient_check(
    forcefield: &dyn ForceField,
    structure: &Structure,
    configuration: &[Point3<f64>],
    step: f64,
) -> Result<DerivativeReport, ForceFieldError> {
    ensure_configuration_size(structure, configuration)?;
    let analytic = forcefield.gradient(structure, configuration)?.to_flat();
    let mut report = DerivativeReport::new();
    for component in 0..analytic.len() {
        let plus = forcefield.energy(structure, &displaced(configuration, component, step))?;
        let minus = forcefield.energy(structure, &displaced(configuration, component, -step))?;
        report.record(component, analytic[component], (plus - minus) / (2.0 * step));
    }
    debug!(
        max_deviation = report.max_deviation,
        worst_component = report.worst_component,
        "Gradient check finished."
    );
    Ok(report)
}

/// Compares the analytic force constants with central differences of the gradient.
pub fn force_constant_check(
    forcefield: &dyn ForceField,
    structure: &Structure,
    configuration: &[Point3<f64>],
    step: f64,
) -> Result<DerivativeReport, ForceFieldError> {
    ensure_configuration_size(structure, configuration)?;
    let analytic = forcefield.force_constants(structure, configuration)?;
    let n = analytic.nrows();
    let mut report = DerivativeReport::new();
    for column in 0..n {
        let plus = forcefield
            .gradient(structure, &displaced(configuration, column, step))?
            .to_flat();
        let minus = forcefield
            .gradient(structure, &displaced(configuration, column, -step))?
            .to_flat();
        let numeric = (plus - minus) / (2.0 * step);
        for row in 0..n {
            report.record(row * n + column, analytic[(row, column)], numeric[row]);
        }
    }
    debug!(
        max_deviation = report.max_deviation,
        worst_component = report.worst_component,
        "Force constant check finished."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::harmonic::HarmonicNetwork;
    use crate::core::models::particle::Particle;

    fn bent_chain() -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::new(0.0, 0.0, 0.0), 1.0),
            Particle::new("B", Point3::new(0.38, 0.0, 0.0), 1.0),
            Particle::new("C", Point3::new(0.5, 0.36, 0.0), 1.0),
            Particle::new("D", Point3::new(0.4, 0.5, 0.3), 1.0),
        ])
    }

    fn strained_network() -> HarmonicNetwork {
        HarmonicNetwork::new()
            .with_spring(0, 1, 100.0, 0.3)
            .with_spring(1, 2, 80.0, 0.45)
            .with_spring(2, 3, 120.0, 0.2)
            .with_spring(0, 3, 40.0, 0.9)
            .with_anchor(0, Point3::new(0.1, 0.1, 0.1), 10.0)
    }

    #[test]
    fn harmonic_network_gradient_matches_energy_differences() {
        let s = bent_chain();
        let report = gradient_check(&strained_network(), &s, &s.positions(), 1e-6).unwrap();
        assert!(report.is_within(1e-6), "{report:?}");
    }

    #[test]
    fn harmonic_network_force_constants_match_gradient_differences() {
        let s = bent_chain();
        let report = force_constant_check(&strained_network(), &s, &s.positions(), 1e-6).unwrap();
        assert!(report.is_within(1e-6), "{report:?}");
    }

    #[test]
    fn report_flags_inconsistent_derivatives() {
        let mut report = DerivativeReport::new();
        report.record(0, 1.0, 1.0);
        report.record(1, 2.0, 1.5);
        assert_eq!(report.worst_component, 1);
        assert!((report.relative_deviation() - 0.25).abs() < 1e-12);
        assert!(!report.is_within(0.1));
    }
}
