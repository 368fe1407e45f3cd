use serde::{Serialize, Deserialize};
use std::f64::consts::E;

/// Squashing function applied to every neuron's `sum + bias`.
///
/// Each variant fixes the whole training pairing: the function, its derivative
/// expressed through the neuron's output, and the one-hot target encoding
/// (`off`, `on`) that lies inside the function's range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// Logistic `1 / (1 + e^-x)`, range (0, 1), targets {0, 1}.
    #[default]
    Sigmoid,
    /// Hyperbolic tangent, range (-1, 1), targets {-1, 1}.
    Tanh,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Slope of the activation at the point where it produced `output`.
    ///
    /// Cached energies are post-activation values, so the derivative is
    /// written in terms of `y = f(x)`: `y(1 - y)` for Sigmoid, `1 - y²` for Tanh.
    pub fn derivative_from_output(&self, output: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => output * (1.0 - output),
            ActivationFunction::Tanh => 1.0 - output * output,
        }
    }

    /// One-hot encoding levels as `(off, on)`.
    pub fn target_levels(&self) -> (f64, f64) {
        match self {
            ActivationFunction::Sigmoid => (0.0, 1.0),
            ActivationFunction::Tanh => (-1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sigmoid_midpoint() {
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.function(0.0), 0.5);
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.function(0.5), 0.622_459_331, epsilon = 1e-9);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let h = 1e-6;
        for act in [ActivationFunction::Sigmoid, ActivationFunction::Tanh] {
            for &x in &[-2.0, -0.3, 0.0, 0.7, 1.9] {
                let numeric = (act.function(x + h) - act.function(x - h)) / (2.0 * h);
                let analytic = act.derivative_from_output(act.function(x));
                assert_abs_diff_eq!(numeric, analytic, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_target_levels_inside_range() {
        assert_eq!(ActivationFunction::Sigmoid.target_levels(), (0.0, 1.0));
        assert_eq!(ActivationFunction::Tanh.target_levels(), (-1.0, 1.0));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ActivationFunction::Tanh).unwrap();
        assert_eq!(json, "\"tanh\"");
        let back: ActivationFunction = serde_json::from_str("\"sigmoid\"").unwrap();
        assert_eq!(back, ActivationFunction::Sigmoid);
    }
}
