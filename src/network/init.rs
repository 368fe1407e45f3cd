use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::network::spec::TopologySpec;

/// Supplies the scalars the topology builder asks for, in canonical order.
///
/// The builder requests every bias first (layer-major, neuron-minor) and then
/// every weight in link order, so a fresh build and a load from a persisted
/// stream consume their sources identically.
pub(crate) trait ParamSource {
    fn next_bias(&mut self) -> Result<f64>;
    fn next_weight(&mut self) -> Result<f64>;
}

/// Uniform random initialization inside the spec's inclusive ranges.
pub(crate) struct RandomParams {
    rng: StdRng,
    weights: Uniform<f64>,
    biases: Uniform<f64>,
}

impl RandomParams {
    /// Expects a validated spec, so both ranges are ordered and finite.
    pub(crate) fn new(spec: &TopologySpec) -> RandomParams {
        let rng = match spec.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomParams {
            rng,
            weights: Uniform::new_inclusive(spec.weight_range.0, spec.weight_range.1),
            biases: Uniform::new_inclusive(spec.bias_range.0, spec.bias_range.1),
        }
    }
}

impl ParamSource for RandomParams {
    fn next_bias(&mut self) -> Result<f64> {
        Ok(self.biases.sample(&mut self.rng))
    }

    fn next_weight(&mut self) -> Result<f64> {
        Ok(self.weights.sample(&mut self.rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_params_repeat() {
        let spec = TopologySpec::new(2, 2, vec![2], 2).with_seed(17);
        let mut a = RandomParams::new(&spec);
        let mut b = RandomParams::new(&spec);
        for _ in 0..10 {
            assert_eq!(a.next_weight().unwrap(), b.next_weight().unwrap());
            assert_eq!(a.next_bias().unwrap(), b.next_bias().unwrap());
        }
    }

    #[test]
    fn test_values_stay_in_range() {
        let spec = TopologySpec::new(2, 2, vec![2], 2).with_ranges((-0.5, 0.25), (0.0, 0.0));
        let mut params = RandomParams::new(&spec);
        for _ in 0..1000 {
            let w = params.next_weight().unwrap();
            assert!((-0.5..=0.25).contains(&w));
            assert_eq!(params.next_bias().unwrap(), 0.0);
        }
    }
}
