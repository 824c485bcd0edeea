//! # Engine Module
//!
//! This module implements the numerical pipeline of the Brownian mode
//! analysis: it turns a structure, a force field and per-particle friction
//! into a set of relaxation modes, and evaluates thermal correlation functions
//! from those modes.
//!
//! ## Overview
//!
//! The pipeline has three stages. The force-constant builder evaluates the
//! Hessian of the force field and weights it by `1/√γ` on both sides, either
//! in full 3N space or projected onto a caller-supplied subspace. The mode
//! solver diagonalizes the weighted matrix. The resulting [`ModeSet`] stores
//! the eigenvalues (inverse relaxation times) and eigenvectors once and builds
//! individual modes on request.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Temperature, subspace, finite-difference
//!   step and solver parameters, plus TOML settings
//! - **Friction** ([`friction`]) - Validated per-particle friction coefficients
//! - **Subspaces** ([`subspace`]) - Rigid-body motions and friction-weighted
//!   orthonormal bases
//! - **Modes** ([`modes`]) - The mode set, modes and fluctuations
//! - **Correlation Functions** ([`correlation`]) - Mean-square displacement,
//!   structure factor, scattering functions and EISF
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Key Capabilities
//!
//! - **Dense and sparse** force-constant input, with sparse×dense products for
//!   subspace projection
//! - **Numeric differentiation** of the gradient along subspace directions when
//!   second derivatives are unavailable
//! - **Parallel orientational averages** behind the `parallel` feature

pub mod config;
pub mod correlation;
pub mod error;
pub(crate) mod force_constants;
pub mod friction;
pub mod modes;
pub mod progress;
pub(crate) mod solver;
pub mod subspace;

pub use modes::{Mode, ModeBasis, ModeSet};
