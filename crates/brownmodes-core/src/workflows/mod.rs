//! # Workflows Module
//!
//! This module provides the one-call procedures that tie the `core` and
//! `engine` layers together.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points of the library. A caller supplies
//! a structure, a force field and friction coefficients and receives a
//! [`ModeSet`](crate::engine::modes::ModeSet) from which correlation functions
//! can be evaluated.
//!
//! ## Architecture
//!
//! - **Brownian Modes** ([`brownian`]) - Force constants, weighting and
//!   diagonalization in one call, with phase progress reporting
//! - **Friction Model** ([`friction`]) - Friction constants for C-alpha models
//!   estimated from local mass density
//! - **Background Execution** ([`task`]) - Runs an analysis on the rayon pool
//!   behind a handle that can be polled, joined and queried for progress

pub mod brownian;
pub mod friction;
pub mod task;
