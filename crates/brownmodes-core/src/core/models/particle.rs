use crate::core::units::{FM, G_PER_MOL};
use nalgebra::Point3;
use std::str::FromStr;

/// Chemical elements with tabulated mass and neutron scattering lengths.
///
/// This enum provides the per-element defaults used when particles are
/// created from an element symbol. Scattering lengths are the bound
/// coherent and incoherent neutron scattering lengths of the natural
/// isotope mixture (deuterium is listed separately because labelling is
/// common in scattering experiments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// Hydrogen.
    Hydrogen,
    /// Deuterium.
    Deuterium,
    /// Carbon.
    Carbon,
    /// Nitrogen.
    Nitrogen,
    /// Oxygen.
    Oxygen,
    /// Phosphorus.
    Phosphorus,
    /// Sulfur.
    Sulfur,
}

impl Element {
    /// Returns the atomic mass in g/mol.
    pub fn mass(&self) -> f64 {
        let amu = match self {
            Element::Hydrogen => 1.008,
            Element::Deuterium => 2.014,
            Element::Carbon => 12.011,
            Element::Nitrogen => 14.007,
            Element::Oxygen => 15.999,
            Element::Phosphorus => 30.974,
            Element::Sulfur => 32.06,
        };
        amu * G_PER_MOL
    }

    /// Returns the bound coherent scattering length in nm.
    pub fn b_coherent(&self) -> f64 {
        let fm = match self {
            Element::Hydrogen => -3.7406,
            Element::Deuterium => 6.671,
            Element::Carbon => 6.6511,
            Element::Nitrogen => 9.37,
            Element::Oxygen => 5.803,
            Element::Phosphorus => 5.13,
            Element::Sulfur => 2.847,
        };
        fm * FM
    }

    /// Returns the bound incoherent scattering length in nm.
    pub fn b_incoherent(&self) -> f64 {
        let fm = match self {
            Element::Hydrogen => 25.274,
            Element::Deuterium => 4.04,
            Element::Carbon => 0.0,
            Element::Nitrogen => 2.0,
            Element::Oxygen => 0.0,
            Element::Phosphorus => 0.2,
            Element::Sulfur => 0.0,
        };
        fm * FM
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses an element symbol or name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "hydrogen" => Ok(Element::Hydrogen),
            "d" | "deuterium" => Ok(Element::Deuterium),
            "c" | "carbon" => Ok(Element::Carbon),
            "n" | "nitrogen" => Ok(Element::Nitrogen),
            "o" | "oxygen" => Ok(Element::Oxygen),
            "p" | "phosphorus" => Ok(Element::Phosphorus),
            "s" | "sulfur" | "sulphur" => Ok(Element::Sulfur),
            _ => Err(()),
        }
    }
}

/// A point particle of a structure with the properties the mode analysis needs.
///
/// Positions are in nm, masses in g/mol and scattering lengths in nm. The
/// particle carries no force field information; interactions are supplied by
/// a [`ForceField`](crate::core::forcefield::ForceField) collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// A descriptive name (e.g. "CA").
    pub name: String,
    /// The equilibrium position.
    pub position: Point3<f64>,
    /// The particle mass.
    pub mass: f64,
    /// The coherent neutron scattering length.
    pub b_coherent: f64,
    /// The incoherent neutron scattering length.
    pub b_incoherent: f64,
}

impl Particle {
    /// Creates a new `Particle` with zero scattering lengths.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the particle.
    /// * `position` - The position of the particle.
    /// * `mass` - The mass of the particle.
    pub fn new(name: &str, position: Point3<f64>, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            position,
            mass,
            b_coherent: 0.0,
            b_incoherent: 0.0,
        }
    }

    /// Creates a particle whose mass and scattering lengths are taken from `element`.
    pub fn from_element(name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            position,
            mass: element.mass(),
            b_coherent: element.b_coherent(),
            b_incoherent: element.b_incoherent(),
        }
    }

    /// Replaces the scattering lengths, consuming and returning the particle.
    pub fn with_scattering_lengths(mut self, b_coherent: f64, b_incoherent: f64) -> Self {
        self.b_coherent = b_coherent;
        self.b_incoherent = b_incoherent;
        self
    }
}
