use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::concurrency::pool::{PoolConfig, WorkerPool};
use crate::error::{NetError, Result};
use crate::layers::{Neuron, NeuronRef, NodeRef};
use crate::loss::SquaredError;
use crate::network::graph::NodeGraph;
use crate::network::init::RandomParams;
use crate::network::passes;
use crate::network::spec::TopologySpec;
use crate::optim::sgd::Sgd;
use crate::persist::codec;
use crate::train::{TrainConfig, TrainReport, TrainingLoop};

/// A network together with the worker pool that evaluates it.
///
/// Energies and errors are memoized per neuron. Loading a new sample does not
/// invalidate them: call [`Network::reset_forward`] (or [`Network::classify`])
/// to evaluate fresh inputs. Several networks may share one pool.
pub struct Network {
    spec: TopologySpec,
    graph: Arc<NodeGraph>,
    pool: Arc<WorkerPool>,
    train_config: TrainConfig,
}

impl Network {
    /// Builds a fresh network with random weights and biases and a default-sized pool.
    pub fn build(spec: TopologySpec) -> Result<Network> {
        let pool = default_pool(&spec)?;
        Network::build_with_pool(spec, pool)
    }

    pub fn build_with_pool(spec: TopologySpec, pool: Arc<WorkerPool>) -> Result<Network> {
        spec.validate()?;
        let graph = NodeGraph::build(&spec, &mut RandomParams::new(&spec))?;
        info!(
            "built network: {} inputs, hidden {:?}, {} outputs, {} links",
            graph.input_count(),
            spec.hidden_layers,
            spec.classes,
            graph.links().len()
        );
        Ok(Network::assemble(spec, graph, pool))
    }

    /// Loads a model file written by [`Network::save`] for the same `spec`.
    pub fn load(path: impl AsRef<Path>, spec: TopologySpec) -> Result<Network> {
        let pool = default_pool(&spec)?;
        Network::load_with_pool(path, spec, pool)
    }

    pub fn load_with_pool(path: impl AsRef<Path>, spec: TopologySpec, pool: Arc<WorkerPool>) -> Result<Network> {
        let graph = codec::load_file(path.as_ref(), &spec)?;
        Ok(Network::assemble(spec, graph, pool))
    }

    /// Like [`Network::load_with_pool`], from any byte stream.
    pub fn read_from<R: Read>(reader: R, spec: TopologySpec, pool: Arc<WorkerPool>) -> Result<Network> {
        let graph = codec::read_model(reader, &spec)?;
        Ok(Network::assemble(spec, graph, pool))
    }

    fn assemble(spec: TopologySpec, graph: NodeGraph, pool: Arc<WorkerPool>) -> Network {
        Network {
            spec,
            graph: Arc::new(graph),
            pool,
            train_config: TrainConfig::default(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        codec::save_file(&self.graph, path.as_ref())
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        codec::write_model(&self.graph, writer)
    }

    pub fn spec(&self) -> &TopologySpec {
        &self.spec
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn train_config(&self) -> &TrainConfig {
        &self.train_config
    }

    pub fn set_train_config(&mut self, config: TrainConfig) {
        self.train_config = config;
    }

    pub fn with_train_config(mut self, config: TrainConfig) -> Self {
        self.train_config = config;
        self
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Writes `sample` into the input grid. Cached energies stay as they are.
    pub fn load_sample(&mut self, sample: &[f64]) -> Result<()> {
        let expected = self.spec.input_size();
        if sample.len() != expected {
            return Err(NetError::SampleSize { got: sample.len(), expected });
        }
        if let Some(index) = sample.iter().position(|v| !v.is_finite()) {
            return Err(NetError::NonFiniteSample { index });
        }
        Arc::make_mut(&mut self.graph).set_inputs(sample);
        Ok(())
    }

    /// Computes every invalidated energy, layer by layer.
    pub fn forward(&mut self) -> Result<()> {
        passes::forward(&mut self.graph, &self.pool, self.spec.activation)
    }

    /// Computes every invalidated hidden error. All outputs must have been taught.
    pub fn backward(&mut self) -> Result<()> {
        self.forward()?;
        passes::backward(&mut self.graph, &self.pool, self.spec.activation)
    }

    /// Invalidates every cached energy. Weights, biases and inputs are kept.
    pub fn reset_forward(&mut self) {
        Arc::make_mut(&mut self.graph).reset_forward();
    }

    /// Invalidates every cached error and teaching target.
    pub fn reset_backward(&mut self) {
        Arc::make_mut(&mut self.graph).reset_backward();
    }

    /// Energy of `node`, running the forward pass first if its cache is invalid.
    pub fn energy(&mut self, node: NodeRef) -> Result<f64> {
        if let NodeRef::Neuron(r) = node {
            if self.graph.neuron(r).energy().is_none() {
                self.forward()?;
            }
        }
        Ok(self.graph.settled_signal(node))
    }

    /// Error of `neuron`, running the backward pass first if its cache is invalid.
    pub fn error(&mut self, neuron: NeuronRef) -> Result<f64> {
        if self.graph.neuron(neuron).error().is_none() {
            self.backward()?;
        }
        Ok(self.graph.neuron(neuron).settled_error())
    }

    /// Cached output energies, or `None` if any output is invalidated.
    pub fn output_energies(&self) -> Option<Vec<f64>> {
        self.graph.output_layer().neurons().iter().map(|n| n.energy()).collect()
    }

    /// Sets the teaching signal of every output from `targets` and returns the
    /// summed squared error. Hidden errors are invalidated.
    ///
    /// Each output's error becomes `(energy - target) · f'(energy)`.
    pub fn teach(&mut self, targets: &[f64]) -> Result<f64> {
        if targets.len() != self.spec.classes {
            return Err(NetError::SampleSize { got: targets.len(), expected: self.spec.classes });
        }
        self.forward()?;

        let activation = self.spec.activation;
        let graph = Arc::make_mut(&mut self.graph);
        graph.reset_backward();
        let outputs = graph.output_neurons_mut();
        let energies: Vec<f64> = outputs.iter().map(Neuron::settled_energy).collect();
        let gradients = SquaredError::derivative(&energies, targets);
        for ((neuron, &target), (&energy, gradient)) in
            outputs.iter_mut().zip(targets).zip(energies.iter().zip(gradients))
        {
            neuron.teach(target, gradient * activation.derivative_from_output(energy));
        }
        Ok(SquaredError::loss(&energies, targets))
    }

    /// Loads `sample`, evaluates it and returns the winning class.
    ///
    /// Memoized energies are reused; see [`Network::classify`] for a fresh evaluation.
    /// Ties go to the lowest class index.
    pub fn evaluate(&mut self, sample: &[f64]) -> Result<usize> {
        self.load_sample(sample)?;
        self.forward()?;
        let energies = self.output_energies().unwrap_or_default();
        Ok(argmax(&energies))
    }

    /// Invalidates cached energies, then evaluates `sample`.
    pub fn classify(&mut self, sample: &[f64]) -> Result<usize> {
        self.reset_forward();
        self.evaluate(sample)
    }

    // -----------------------------------------------------------------------
    // Training
    // -----------------------------------------------------------------------

    /// Trains on one sample with the network's `TrainConfig`; returns the final squared error.
    pub fn train(&mut self, sample: &[f64], class: usize) -> Result<f64> {
        Ok(self.train_report(sample, class)?.final_error)
    }

    pub fn train_report(&mut self, sample: &[f64], class: usize) -> Result<TrainReport> {
        TrainingLoop::new(self.train_config).run(self, sample, class)
    }

    /// One gradient step over every weight and bias, then invalidates all caches.
    pub(crate) fn apply_update(&mut self, optimizer: &Sgd) {
        let graph = Arc::make_mut(&mut self.graph);
        optimizer.step(graph);
        graph.reset_forward();
        graph.reset_backward();
    }
}

/// Index of the first strictly greatest value; 0 for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn default_pool(spec: &TopologySpec) -> Result<Arc<WorkerPool>> {
    spec.validate()?;
    Ok(Arc::new(WorkerPool::new(PoolConfig::default())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SIGMOID_OF_HALF: f64 = 0.622_459_331_201_854_6;

    fn small_pool() -> Arc<WorkerPool> {
        Arc::new(WorkerPool::new(PoolConfig::new(2, 4)).unwrap())
    }

    fn constant_network(inputs: usize, hidden: Vec<usize>, classes: usize, weight: f64) -> Network {
        let spec = TopologySpec::new(inputs, 1, hidden, classes)
            .with_ranges((weight, weight), (0.0, 0.0));
        Network::build_with_pool(spec, small_pool()).unwrap()
    }

    #[test]
    fn test_argmax_prefers_lowest_on_tie() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_zero_network_outputs_half() {
        let mut network = constant_network(4, vec![3], 3, 0.0);
        network.evaluate(&[0.9, 0.1, 0.4, 1.0]).unwrap();
        for energy in network.output_energies().unwrap() {
            assert_abs_diff_eq!(energy, 0.5);
        }
    }

    #[test]
    fn test_single_path_energies() {
        let mut network = constant_network(1, vec![1], 1, 1.0);
        network.evaluate(&[0.0]).unwrap();
        let hidden = network.energy(NodeRef::Neuron(NeuronRef::new(0, 0))).unwrap();
        let output = network.energy(NodeRef::Neuron(NeuronRef::new(1, 0))).unwrap();
        assert_abs_diff_eq!(hidden, 0.5);
        assert_abs_diff_eq!(output, SIGMOID_OF_HALF, epsilon = 1e-12);
    }

    #[test]
    fn test_energy_is_lazy() {
        let mut network = constant_network(1, vec![1], 1, 1.0);
        network.load_sample(&[0.0]).unwrap();
        assert!(network.output_energies().is_none());
        let output = network.energy(NodeRef::Neuron(NeuronRef::new(1, 0))).unwrap();
        assert_abs_diff_eq!(output, SIGMOID_OF_HALF, epsilon = 1e-12);
        assert_eq!(network.energy(NodeRef::Input(0)).unwrap(), 0.0);
    }

    #[test]
    fn test_teach_sets_output_error() {
        let mut network = constant_network(1, vec![1], 1, 1.0);
        network.load_sample(&[0.0]).unwrap();
        let loss = network.teach(&[1.0]).unwrap();

        let y = SIGMOID_OF_HALF;
        assert_abs_diff_eq!(loss, (y - 1.0) * (y - 1.0), epsilon = 1e-12);
        let output_error = network.error(NeuronRef::new(1, 0)).unwrap();
        assert_abs_diff_eq!(output_error, (y - 1.0) * y * (1.0 - y), epsilon = 1e-12);

        // hidden: f'(0.5) * weight * output error
        let hidden_error = network.error(NeuronRef::new(0, 0)).unwrap();
        assert_abs_diff_eq!(hidden_error, 0.25 * output_error, epsilon = 1e-12);
    }

    #[test]
    fn test_backward_before_teach_is_rejected() {
        let mut network = constant_network(2, vec![2], 2, 0.5);
        network.load_sample(&[0.1, 0.2]).unwrap();
        assert!(matches!(network.backward(), Err(NetError::Untaught { index: 0 })));
    }

    #[test]
    fn test_sample_validation() {
        let mut network = constant_network(3, vec![2], 2, 0.1);
        assert!(matches!(
            network.evaluate(&[0.0, 1.0]),
            Err(NetError::SampleSize { got: 2, expected: 3 })
        ));
        assert!(matches!(
            network.evaluate(&[0.0, f64::NAN, 1.0]),
            Err(NetError::NonFiniteSample { index: 1 })
        ));
    }

    #[test]
    fn test_class_out_of_range() {
        let mut network = constant_network(2, vec![2], 2, 0.1);
        assert!(matches!(
            network.train(&[0.0, 1.0], 2),
            Err(NetError::ClassOutOfRange { class: 2, classes: 2 })
        ));
    }
}
