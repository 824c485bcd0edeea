use crate::core::forcefield::ForceField;
use crate::core::models::structure::Structure;
use crate::engine::config::ModeConfig;
use crate::engine::error::EngineError;
use crate::engine::force_constants;
use crate::engine::friction::FrictionField;
use crate::engine::modes::ModeSet;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver;
use tracing::{info, instrument};

/// Computes the Brownian relaxation modes of `structure`.
///
/// The structure's current configuration is taken as the equilibrium point.
/// The returned [`ModeSet`] owns a copy of the structure and the friction.
///
/// # Errors
///
/// Returns an error if the friction belongs to another structure snapshot,
/// if the configuration is inconsistent, if the force field cannot supply
/// the required derivatives, or if diagonalization fails.
#[instrument(skip_all, name = "brownian_modes_workflow")]
pub fn run(
    structure: &Structure,
    forcefield: &dyn ForceField,
    friction: FrictionField,
    config: &ModeConfig,
    reporter: &ProgressReporter,
) -> Result<ModeSet, EngineError> {
    info!(
        particles = structure.len(),
        subspace = config.subspace.is_some(),
        sparse = config.sparse,
        "Starting Brownian mode analysis."
    );

    // === Phase 1: Weighted force constants ===
    let weighted = force_constants::build(structure, forcefield, &friction, config, reporter)?;

    // === Phase 2: Diagonalization ===
    reporter.report(Progress::PhaseStart { name: "Diagonalization" });
    let eigensystem = solver::solve(
        weighted,
        config.negative_eigenvalue_tolerance,
        config.max_iterations,
    )?;
    reporter.report(Progress::PhaseFinish);

    let modes = ModeSet::new(structure.clone(), friction, config.temperature, eigensystem);
    reporter.report(Progress::Finished { modes: modes.len() });
    info!("Mode analysis complete with {} mode(s).", modes.len());
    Ok(modes)
}
