//! # Core Models Module
//!
//! This module contains the data structures that describe the particle system a
//! mode analysis is carried out on.
//!
//! ## Overview
//!
//! A [`Structure`](structure::Structure) is a fixed list of particles together
//! with its current configuration. It is the "universe" every particle field is
//! defined over: fields remember the identity and configuration version of the
//! structure they were created for, so that quantities from different
//! structures, or from an outdated configuration, are never combined.
//!
//! ## Key Components
//!
//! - [`particle`] - Point particles with mass and neutron scattering lengths
//! - [`structure`] - The structure snapshot, its identity and version stamp
//!
//! ## Usage
//!
//! ```ignore
//! use brownmodes::core::models::{particle::{Element, Particle}, structure::Structure};
//!
//! let structure = Structure::new(vec![
//!     Particle::from_element("C1", Element::Carbon, Point3::new(0.0, 0.0, 0.0)),
//!     Particle::from_element("C2", Element::Carbon, Point3::new(0.15, 0.0, 0.0)),
//! ]);
//! let masses = structure.masses();
//! ```

pub mod particle;
pub mod structure;
