/// Summed squared error over the output layer, the quantity training drives below epsilon.
pub struct SquaredError;

impl SquaredError {
    /// Σ (predicted - expected)²
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }

    /// Per-output gradient of ½·loss: predicted - expected
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| a - b)
            .collect()
    }
}

/// Target vector for `class`: `on` at that position, `off` everywhere else.
pub fn one_hot(class: usize, classes: usize, (off, on): (f64, f64)) -> Vec<f64> {
    (0..classes).map(|i| if i == class { on } else { off }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_is_a_sum() {
        assert_eq!(SquaredError::loss(&[0.5, 0.5], &[1.0, 0.0]), 0.5);
        assert_eq!(SquaredError::derivative(&[0.5, 0.25], &[1.0, 0.0]), vec![-0.5, 0.25]);
    }

    #[test]
    fn test_one_hot_levels() {
        assert_eq!(one_hot(1, 3, (0.0, 1.0)), vec![0.0, 1.0, 0.0]);
        assert_eq!(one_hot(0, 2, (-1.0, 1.0)), vec![1.0, -1.0]);
    }
}
