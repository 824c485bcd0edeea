use crate::core::fields::vector::VectorField;
use crate::core::units::K_B;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default relative tolerance below which negative eigenvalues are clamped to zero.
pub const DEFAULT_NEGATIVE_EIGENVALUE_TOLERANCE: f64 = 1e-8;

/// Default temperature in K.
pub const DEFAULT_TEMPERATURE: f64 = 300.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Numeric differentiation (delta) requires a subspace")]
    NumericDifferentiationRequiresSubspace,

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Subspace basis is empty")]
    EmptySubspace,

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// The temperature that scales thermal averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    /// An absolute temperature in K; `kT = k_B T`.
    Kelvin(f64),
    /// No thermal scaling; `kT = 1`.
    Unscaled,
}

impl Default for Temperature {
    fn default() -> Self {
        Temperature::Kelvin(DEFAULT_TEMPERATURE)
    }
}

impl Temperature {
    /// Returns the thermal energy in kJ/mol.
    pub fn kt(&self) -> f64 {
        match self {
            Temperature::Kelvin(t) => K_B * t,
            Temperature::Unscaled => 1.0,
        }
    }
}

/// A set of 3N-dimensional vectors spanning the space modes are computed in.
///
/// Directions in `excluded` are projected out of the basis before it is
/// orthonormalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Subspace {
    pub basis: Vec<VectorField>,
    pub excluded: Vec<VectorField>,
}

impl Subspace {
    pub fn new(basis: Vec<VectorField>) -> Self {
        Self {
            basis,
            excluded: Vec::new(),
        }
    }

    pub fn excluding(mut self, excluded: Vec<VectorField>) -> Self {
        self.excluded = excluded;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeConfig {
    pub temperature: Temperature,
    pub subspace: Option<Subspace>,
    /// Finite-difference step in nm for numeric force constants in the subspace.
    pub delta: Option<f64>,
    pub sparse: bool,
    pub negative_eigenvalue_tolerance: f64,
    /// Iteration cap of the eigensolver; 0 means unlimited.
    pub max_iterations: usize,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            temperature: Temperature::default(),
            subspace: None,
            delta: None,
            sparse: false,
            negative_eigenvalue_tolerance: DEFAULT_NEGATIVE_EIGENVALUE_TOLERANCE,
            max_iterations: 0,
        }
    }
}

#[derive(Default)]
pub struct ModeConfigBuilder {
    temperature: Option<Temperature>,
    subspace: Option<Subspace>,
    delta: Option<f64>,
    sparse: Option<bool>,
    negative_eigenvalue_tolerance: Option<f64>,
    max_iterations: Option<usize>,
}

impl ModeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn subspace(mut self, subspace: Subspace) -> Self {
        self.subspace = Some(subspace);
        self
    }
    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }
    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = Some(sparse);
        self
    }
    pub fn negative_eigenvalue_tolerance(mut self, tolerance: f64) -> Self {
        self.negative_eigenvalue_tolerance = Some(tolerance);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn build(self) -> Result<ModeConfig, ConfigError> {
        let defaults = ModeConfig::default();

        let temperature = self.temperature.unwrap_or(defaults.temperature);
        if let Temperature::Kelvin(t) = temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "temperature",
                    reason: format!("must be positive and finite, got {t}"),
                });
            }
        }

        if let Some(subspace) = &self.subspace {
            if subspace.basis.is_empty() {
                return Err(ConfigError::EmptySubspace);
            }
        }

        if let Some(delta) = self.delta {
            if self.subspace.is_none() {
                return Err(ConfigError::NumericDifferentiationRequiresSubspace);
            }
            if !delta.is_finite() || delta <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "delta",
                    reason: format!("must be positive and finite, got {delta}"),
                });
            }
        }

        let negative_eigenvalue_tolerance = self
            .negative_eigenvalue_tolerance
            .unwrap_or(defaults.negative_eigenvalue_tolerance);
        if !negative_eigenvalue_tolerance.is_finite() || negative_eigenvalue_tolerance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "negative_eigenvalue_tolerance",
                reason: format!("must be non-negative, got {negative_eigenvalue_tolerance}"),
            });
        }

        Ok(ModeConfig {
            temperature,
            subspace: self.subspace,
            delta: self.delta,
            sparse: self.sparse.unwrap_or(defaults.sparse),
            negative_eigenvalue_tolerance,
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
        })
    }
}

/// Settings for the mode analysis as read from a TOML file.
///
/// Vector-valued options such as the subspace cannot be expressed in a file;
/// [`into_builder`](Self::into_builder) returns a builder the caller can extend.
///
/// ```toml
/// temperature = 310.0
/// sparse = true
/// max-iterations = 10000
///
/// [correlation]
/// first-mode = 6
/// directions = 30
/// seed = 1234
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ModeSettings {
    /// Temperature in K. Ignored when `unscaled` is set.
    pub temperature: Option<f64>,
    #[serde(default)]
    pub unscaled: bool,
    pub delta: Option<f64>,
    #[serde(default)]
    pub sparse: bool,
    pub negative_eigenvalue_tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub correlation: CorrelationSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CorrelationSettings {
    #[serde(default = "CorrelationSettings::default_first_mode")]
    pub first_mode: usize,
    #[serde(default = "CorrelationSettings::default_directions")]
    pub directions: usize,
    pub seed: Option<u64>,
}

impl CorrelationSettings {
    fn default_first_mode() -> usize {
        6
    }
    fn default_directions() -> usize {
        15
    }
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            first_mode: Self::default_first_mode(),
            directions: Self::default_directions(),
            seed: None,
        }
    }
}

impl ModeSettings {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let settings = Self::from_toml_str(&content, &path.to_string_lossy())?;
        debug!(path = %path.display(), "Loaded mode settings.");
        Ok(settings)
    }

    pub fn temperature(&self) -> Temperature {
        if self.unscaled {
            Temperature::Unscaled
        } else {
            Temperature::Kelvin(self.temperature.unwrap_or(DEFAULT_TEMPERATURE))
        }
    }

    /// Returns a builder preloaded with these settings.
    pub fn into_builder(self) -> ModeConfigBuilder {
        let mut builder = ModeConfigBuilder::new()
            .temperature(self.temperature())
            .sparse(self.sparse);
        if let Some(delta) = self.delta {
            builder = builder.delta(delta);
        }
        if let Some(tolerance) = self.negative_eigenvalue_tolerance {
            builder = builder.negative_eigenvalue_tolerance(tolerance);
        }
        if let Some(iterations) = self.max_iterations {
            builder = builder.max_iterations(iterations);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::core::models::structure::Structure;
    use nalgebra::Point3;
    use std::fs;
    use tempfile::tempdir;

    fn basis() -> Vec<VectorField> {
        let s = Structure::new(vec![Particle::new("A", Point3::origin(), 1.0)]);
        vec![VectorField::zeros(&s)]
    }

    #[test]
    fn default_build_uses_room_temperature_and_dense_full_mode() {
        let config = ModeConfigBuilder::new().build().unwrap();
        assert_eq!(config.temperature, Temperature::Kelvin(300.0));
        assert!(config.subspace.is_none());
        assert!(!config.sparse);
        assert_eq!(
            config.negative_eigenvalue_tolerance,
            DEFAULT_NEGATIVE_EIGENVALUE_TOLERANCE
        );
        assert_eq!(config.max_iterations, 0);
    }

    #[test]
    fn delta_without_subspace_is_rejected() {
        let result = ModeConfigBuilder::new().delta(1e-4).build();
        assert!(matches!(
            result,
            Err(ConfigError::NumericDifferentiationRequiresSubspace)
        ));
    }

    #[test]
    fn non_positive_delta_is_rejected() {
        let result = ModeConfigBuilder::new()
            .subspace(Subspace::new(basis()))
            .delta(0.0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "delta", .. })
        ));
    }

    #[test]
    fn empty_subspace_is_rejected() {
        let result = ModeConfigBuilder::new()
            .subspace(Subspace::new(Vec::new()))
            .build();
        assert!(matches!(result, Err(ConfigError::EmptySubspace)));
    }

    #[test]
    fn negative_temperature_is_rejected() {
        let result = ModeConfigBuilder::new()
            .temperature(Temperature::Kelvin(-1.0))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn unscaled_temperature_has_unit_kt() {
        assert_eq!(Temperature::Unscaled.kt(), 1.0);
        assert!((Temperature::Kelvin(300.0).kt() - 2.494_338_785).abs() < 1e-6);
    }

    #[test]
    fn settings_load_from_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modes.toml");
        let toml = r#"
            temperature = 310.0
            sparse = true
            max-iterations = 500
            negative-eigenvalue-tolerance = 1e-6

            [correlation]
            directions = 30
            seed = 99
            "#;
        fs::write(&path, toml).unwrap();

        let settings = ModeSettings::load(&path).unwrap();
        assert_eq!(settings.temperature(), Temperature::Kelvin(310.0));
        assert_eq!(settings.correlation.first_mode, 6);
        assert_eq!(settings.correlation.directions, 30);
        assert_eq!(settings.correlation.seed, Some(99));

        let config = settings.into_builder().build().unwrap();
        assert!(config.sparse);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.negative_eigenvalue_tolerance, 1e-6);
    }

    #[test]
    fn settings_reject_unknown_keys() {
        let result = ModeSettings::from_toml_str("temprature = 300.0", "inline");
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn missing_settings_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = ModeSettings::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn unscaled_flag_overrides_temperature() {
        let settings = ModeSettings::from_toml_str("temperature = 10.0\nunscaled = true", "inline")
            .unwrap();
        assert_eq!(settings.temperature(), Temperature::Unscaled);
    }
}
