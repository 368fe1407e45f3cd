use log::debug;

use crate::error::{NetError, Result};
use crate::loss::one_hot;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::report::TrainReport;
use crate::train::train_config::TrainConfig;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Evaluate,
    CheckConvergence(f64),
    UpdateWeights,
    Stop,
}

/// Online gradient descent on a single labelled sample.
///
/// Cycles `Evaluate → CheckConvergence → UpdateWeights → Evaluate` until the
/// squared error drops below `epsilon` or `max_steps` evaluations have run.
/// A converged sample leaves the weights untouched by its final step.
pub struct TrainingLoop {
    config: TrainConfig,
    optimizer: Sgd,
}

impl TrainingLoop {
    pub fn new(config: TrainConfig) -> Self {
        TrainingLoop {
            config,
            optimizer: Sgd::new(config.learning_rate),
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Trains `network` on `sample` towards `class` and reports every measured error.
    ///
    /// The sample must already be normalized into the activation's input domain.
    pub fn run(&self, network: &mut Network, sample: &[f64], class: usize) -> Result<TrainReport> {
        let classes = network.spec().classes;
        if class >= classes {
            return Err(NetError::ClassOutOfRange { class, classes });
        }
        let targets = one_hot(class, classes, network.spec().activation.target_levels());
        let max_steps = self.config.max_steps.max(1);

        network.load_sample(sample)?;
        network.reset_forward();
        network.reset_backward();

        let mut errors = Vec::with_capacity(max_steps);
        let mut converged = false;
        let mut phase = Phase::Evaluate;
        loop {
            phase = match phase {
                Phase::Evaluate => {
                    network.forward()?;
                    let error = network.teach(&targets)?;
                    network.backward()?;
                    errors.push(error);
                    debug!("step {}: squared error {error:.8}", errors.len());
                    Phase::CheckConvergence(error)
                }
                Phase::CheckConvergence(error) => {
                    if error < self.config.epsilon {
                        converged = true;
                        Phase::Stop
                    } else {
                        Phase::UpdateWeights
                    }
                }
                Phase::UpdateWeights => {
                    network.apply_update(&self.optimizer);
                    if errors.len() >= max_steps {
                        Phase::Stop
                    } else {
                        Phase::Evaluate
                    }
                }
                Phase::Stop => break,
            };
        }

        Ok(TrainReport {
            final_error: errors.last().copied().unwrap_or_default(),
            steps: errors.len(),
            converged,
            errors,
        })
    }
}
