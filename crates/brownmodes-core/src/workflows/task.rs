use super::brownian;
use crate::core::forcefield::ForceField;
use crate::core::models::structure::Structure;
use crate::engine::config::ModeConfig;
use crate::engine::error::EngineError;
use crate::engine::friction::FrictionField;
use crate::engine::modes::ModeSet;
use crate::engine::progress::{Progress, ProgressReporter};
use crossbeam_channel::{Receiver, TryRecvError, unbounded};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, warn};

type TaskResult = thread::Result<Result<ModeSet, EngineError>>;

/// A mode analysis to be run in the background.
///
/// The task owns all of its inputs. [`spawn`](Self::spawn) submits it to the
/// rayon worker pool and returns an [`AnalysisHandle`].
pub struct AnalysisTask {
    structure: Structure,
    forcefield: Arc<dyn ForceField>,
    friction: FrictionField,
    config: ModeConfig,
}

impl AnalysisTask {
    pub fn new(
        structure: Structure,
        forcefield: Arc<dyn ForceField>,
        friction: FrictionField,
        config: ModeConfig,
    ) -> Self {
        Self {
            structure,
            forcefield,
            friction,
            config,
        }
    }

    pub fn spawn(self) -> AnalysisHandle {
        let (result_tx, result_rx) = unbounded::<TaskResult>();
        let progress = Arc::new(Mutex::new(None));
        let snapshot = Arc::clone(&progress);

        rayon::spawn(move || {
            let reporter = ProgressReporter::with_callback(Box::new(move |event| {
                if let Ok(mut last) = snapshot.lock() {
                    *last = Some(event);
                }
            }));
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                brownian::run(
                    &self.structure,
                    self.forcefield.as_ref(),
                    self.friction,
                    &self.config,
                    &reporter,
                )
            }));
            if result_tx.send(result).is_err() {
                debug!("Analysis handle dropped before the result was delivered.");
            }
        });

        AnalysisHandle {
            receiver: result_rx,
            progress,
        }
    }
}

/// A handle to a running [`AnalysisTask`].
///
/// The worker sends exactly one result. Once it has been taken and the worker
/// has exited, the channel is disconnected and further joins report
/// [`EngineError::TaskFailed`].
pub struct AnalysisHandle {
    receiver: Receiver<TaskResult>,
    progress: Arc<Mutex<Option<Progress>>>,
}

impl AnalysisHandle {
    /// Returns `true` while a delivered result is waiting to be taken.
    pub fn is_finished(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Returns the result if the task has finished, without blocking.
    ///
    /// Returns `None` while the task is running.
    pub fn try_join(&mut self) -> Option<Result<ModeSet, EngineError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(unwrap_task_result(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(no_result())),
        }
    }

    /// Blocks until the task has finished and returns its result.
    pub fn join(self) -> Result<ModeSet, EngineError> {
        match self.receiver.recv() {
            Ok(result) => unwrap_task_result(result),
            Err(_) => Err(no_result()),
        }
    }

    /// Returns the most recent progress event reported by the worker.
    pub fn last_progress(&self) -> Option<Progress> {
        self.progress.lock().ok().and_then(|last| last.clone())
    }
}

fn no_result() -> EngineError {
    EngineError::TaskFailed("worker exited without a result".to_string())
}

fn unwrap_task_result(result: TaskResult) -> Result<ModeSet, EngineError> {
    result.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(%message, "Mode analysis panicked.");
        Err(EngineError::TaskFailed(message))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "analysis panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::vector::VectorField;
    use crate::core::forcefield::ForceFieldError;
    use crate::core::forcefield::harmonic::HarmonicNetwork;
    use crate::core::models::particle::Particle;
    use nalgebra::Point3;
    use std::time::Duration;

    fn dimer() -> Structure {
        Structure::new(vec![
            Particle::new("A", Point3::origin(), 12.0),
            Particle::new("B", Point3::new(0.38, 0.0, 0.0), 12.0),
        ])
    }

    fn task(forcefield: Arc<dyn ForceField>) -> AnalysisTask {
        let s = dimer();
        let friction = FrictionField::uniform(&s, 10.0).unwrap();
        AnalysisTask::new(s, forcefield, friction, ModeConfig::default())
    }

    struct GradientOnly;

    impl ForceField for GradientOnly {
        fn energy(&self, _: &Structure, _: &[Point3<f64>]) -> Result<f64, ForceFieldError> {
            Ok(0.0)
        }

        fn gradient(
            &self,
            structure: &Structure,
            _: &[Point3<f64>],
        ) -> Result<VectorField, ForceFieldError> {
            Ok(VectorField::zeros(structure))
        }
    }

    struct Panicking;

    impl ForceField for Panicking {
        fn energy(&self, _: &Structure, _: &[Point3<f64>]) -> Result<f64, ForceFieldError> {
            panic!("energy exploded")
        }

        fn gradient(
            &self,
            _: &Structure,
            _: &[Point3<f64>],
        ) -> Result<VectorField, ForceFieldError> {
            panic!("gradient exploded")
        }

        fn force_constants(
            &self,
            _: &Structure,
            _: &[Point3<f64>],
        ) -> Result<nalgebra::DMatrix<f64>, ForceFieldError> {
            panic!("force constants exploded")
        }
    }

    #[test]
    fn join_returns_modes_and_final_progress() {
        let network = HarmonicNetwork::new().with_spring(0, 1, 100.0, 0.38);
        let handle = task(Arc::new(network)).spawn();
        let progress = Arc::clone(&handle.progress);
        let modes = handle.join().unwrap();
        assert_eq!(modes.len(), 6);
        assert_eq!(
            progress.lock().unwrap().clone(),
            Some(Progress::Finished { modes: 6 })
        );
    }

    #[test]
    fn try_join_polls_until_finished() {
        let network = HarmonicNetwork::new().with_spring(0, 1, 100.0, 0.38);
        let mut handle = task(Arc::new(network)).spawn();
        let result = loop {
            if let Some(result) = handle.try_join() {
                break result;
            }
            thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(result.unwrap().len(), 6);
        assert_eq!(handle.last_progress(), Some(Progress::Finished { modes: 6 }));
        assert!(matches!(handle.join(), Err(EngineError::TaskFailed(_))));
    }

    #[test]
    fn is_finished_keeps_result_for_join() {
        let network = HarmonicNetwork::new().with_spring(0, 1, 100.0, 0.38);
        let handle = task(Arc::new(network)).spawn();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(handle.is_finished());
        assert!(handle.join().is_ok());
    }

    #[test]
    fn collaborator_errors_are_returned_unchanged() {
        let result = task(Arc::new(GradientOnly)).spawn().join();
        assert!(matches!(
            result,
            Err(EngineError::ForceField(ForceFieldError::DerivativesUnavailable(_)))
        ));
    }

    #[test]
    fn panics_become_task_failures() {
        let result = task(Arc::new(Panicking)).spawn().join();
        assert!(matches!(
            result,
            Err(EngineError::TaskFailed(message)) if message.contains("exploded")
        ));
    }
}
