//! # Core Module
//!
//! This module provides the stateless building blocks of the normal-mode
//! analysis: the particle model, the per-particle field algebra, the interface
//! to force-field collaborators and small numerical utilities.
//!
//! ## Architecture
//!
//! - **Particle Representation** ([`models`]) - Particles and structure snapshots
//! - **Field Algebra** ([`fields`]) - Scalar, vector, tensor and pair-tensor fields
//!   over the particles of a snapshot, with checked arithmetic
//! - **Force Fields** ([`forcefield`]) - The collaborator trait that supplies
//!   energies and derivatives, and a harmonic reference network
//! - **Utilities** ([`utils`]) - Random orientation sampling and sampling grids
//! - **Units** ([`units`]) - Physical constants in the internal unit system
//!
//! ## Scientific Foundation
//!
//! The analysis is harmonic: around an equilibrium configuration the potential
//! energy is replaced by its second-order expansion. Combined with overdamped
//! (Brownian) dynamics under per-particle friction, the motion decomposes into
//! independent relaxation modes whose rates are the eigenvalues of the
//! friction-weighted force-constant matrix.

pub mod fields;
pub mod forcefield;
pub mod models;
pub mod units;
pub mod utils;
