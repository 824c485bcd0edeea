//! # brownmodes
//!
//! A library for Brownian normal-mode analysis: the independent relaxation
//! motions of a harmonic structure under per-particle friction, and the
//! thermal correlation functions (mean-square displacement, structure factor,
//! scattering functions) that follow from them.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture so that each layer can
//! be tested on its own.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`,
//!   `Particle`), the per-particle field algebra with snapshot compatibility
//!   checks, the `ForceField` collaborator trait with a harmonic reference
//!   network, and numerical utilities.
//!
//! - **[`engine`]: The Logic Core.** The numerical pipeline. It builds the
//!   friction-weighted force-constant matrix (dense, sparse or projected onto a
//!   subspace), diagonalizes it into a `ModeSet`, and evaluates correlation
//!   functions from the modes.
//!
//! - **[`workflows`]: The Public API.** One-call procedures that run the whole
//!   analysis, estimate friction for C-alpha models, and execute analyses in
//!   the background.

pub mod core;
pub mod engine;
pub mod workflows;
