use serde::{Serialize, Deserialize};

/// Configuration for a `TrainingLoop` run on one sample.
///
/// # Fields
/// - `learning_rate` — step size of every weight and bias update
/// - `epsilon`       — training stops once the summed squared error drops below this
/// - `max_steps`     — cap on evaluate/update cycles per sample; values below 1 act as 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub epsilon: f64,
    pub max_steps: usize,
}

impl TrainConfig {
    pub fn new(learning_rate: f64, epsilon: f64, max_steps: usize) -> Self {
        TrainConfig { learning_rate, epsilon, max_steps }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(0.03, 1e-7, 10)
    }
}
