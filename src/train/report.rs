use serde::{Serialize, Deserialize};

/// Outcome of training on one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// Summed squared error measured at the last evaluation.
    pub final_error: f64,
    /// Number of evaluations performed (1-based).
    pub steps: usize,
    /// True when the loop stopped because the error fell below epsilon.
    pub converged: bool,
    /// Squared error measured at every step, oldest first.
    pub errors: Vec<f64>,
}
