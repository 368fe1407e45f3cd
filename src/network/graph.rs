use crate::activation::activation::ActivationFunction;
use crate::error::{NetError, Result};
use crate::layers::{InputNode, Layer, LayerRole, Link, LinkId, Neuron, NeuronRef, Node, NodeRef};
use crate::network::init::ParamSource;
use crate::network::spec::TopologySpec;

/// A dense block of links: every source of one layer to every neuron of another.
///
/// `source_layer` is `None` for the input grid. Blocks are listed, and links
/// inside a block enumerated source-major / target-minor, in the exact order
/// the persisted model stores their weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkBlock {
    pub source_layer: Option<usize>,
    pub sources: usize,
    pub target_layer: usize,
    pub targets: usize,
}

impl LinkBlock {
    pub fn len(&self) -> usize {
        self.sources * self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn source(&self, index: usize) -> NodeRef {
        match self.source_layer {
            None => NodeRef::Input(index),
            Some(layer) => NodeRef::Neuron(NeuronRef::new(layer, index)),
        }
    }

    /// All `(source, target)` pairs of this block in canonical order.
    pub fn edges(self) -> impl Iterator<Item = (NodeRef, NeuronRef)> {
        (0..self.sources).flat_map(move |i| {
            (0..self.targets).map(move |j| (self.source(i), NeuronRef::new(self.target_layer, j)))
        })
    }
}

/// Canonical link layout of a topology: input → first hidden, last hidden →
/// output, each hidden layer → the next, then the optional input → output shortcuts.
///
/// Empty for a spec without hidden layers, which `validate` rejects.
pub fn link_blocks(spec: &TopologySpec) -> Vec<LinkBlock> {
    let hidden = &spec.hidden_layers;
    let (Some(&first), Some(&last_width)) = (hidden.first(), hidden.last()) else {
        return Vec::new();
    };
    let output = hidden.len();
    let last = hidden.len() - 1;

    let mut blocks = vec![
        LinkBlock { source_layer: None, sources: spec.input_size(), target_layer: 0, targets: first },
        LinkBlock { source_layer: Some(last), sources: last_width, target_layer: output, targets: spec.classes },
    ];
    for layer in 0..last {
        blocks.push(LinkBlock {
            source_layer: Some(layer),
            sources: hidden[layer],
            target_layer: layer + 1,
            targets: hidden[layer + 1],
        });
    }
    if spec.shortcut_links {
        blocks.push(LinkBlock { source_layer: None, sources: spec.input_size(), target_layer: output, targets: spec.classes });
    }
    blocks
}

/// Owner of every input node, neuron and link of one network.
///
/// Neuron layers are stored hidden-first with the output layer last; links live
/// in one flat arena in canonical order and are addressed by [`LinkId`].
/// Connectivity never changes after construction.
#[derive(Debug, Clone)]
pub struct NodeGraph {
    inputs: Vec<InputNode>,
    layers: Vec<Layer>,
    links: Vec<Link>,
}

impl NodeGraph {
    /// Allocates the topology described by `spec`, drawing every bias and then
    /// every weight from `params` in canonical order.
    pub(crate) fn build(spec: &TopologySpec, params: &mut impl ParamSource) -> Result<NodeGraph> {
        spec.validate()?;

        let sizes = spec.neuron_layer_sizes();
        let output = sizes.len() - 1;
        let mut layers = Vec::with_capacity(sizes.len());
        for (layer, &size) in sizes.iter().enumerate() {
            let role = if layer == output { LayerRole::Output } else { LayerRole::Hidden };
            let biases = (0..size).map(|_| params.next_bias()).collect::<Result<Vec<f64>>>()?;
            layers.push(Layer::new(role, biases));
        }

        let mut graph = NodeGraph {
            inputs: vec![InputNode::default(); spec.input_size()],
            layers,
            links: Vec::with_capacity(spec.weight_count()),
        };
        for block in link_blocks(spec) {
            for (source, target) in block.edges() {
                let weight = params.next_weight()?;
                graph.connect(source, target, weight);
            }
        }
        Ok(graph)
    }

    fn connect(&mut self, source: NodeRef, target: NeuronRef, weight: f64) {
        let id = LinkId(self.links.len());
        self.links.push(Link::new(source, target, weight));
        if let NodeRef::Neuron(from) = source {
            self.neuron_mut(from).attach_outgoing(id);
        }
        self.neuron_mut(target).attach_incoming(id);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn inputs(&self) -> &[InputNode] {
        &self.inputs
    }

    /// Number of neuron layers, output layer included.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, layer: usize) -> &Layer {
        &self.layers[layer]
    }

    pub fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    pub fn output_index(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn neuron(&self, neuron: NeuronRef) -> &Neuron {
        self.layers[neuron.layer].neuron(neuron.index)
    }

    pub(crate) fn neuron_mut(&mut self, neuron: NeuronRef) -> &mut Neuron {
        self.layers[neuron.layer].neuron_mut(neuron.index)
    }

    pub(crate) fn output_neurons_mut(&mut self) -> &mut [Neuron] {
        let output = self.layers.len() - 1;
        self.layers[output].neurons_mut()
    }

    /// Role-tagged view of any node.
    pub fn node(&self, node: NodeRef) -> Node<'_> {
        match node {
            NodeRef::Input(index) => Node::Input(&self.inputs[index]),
            NodeRef::Neuron(r) if r.layer == self.output_index() => Node::Output(self.neuron(r)),
            NodeRef::Neuron(r) => Node::Hidden(self.neuron(r)),
        }
    }

    /// Every bias in canonical order: hidden layers first, outputs last.
    pub fn biases(&self) -> impl Iterator<Item = f64> + '_ {
        self.layers.iter().flat_map(|layer| layer.neurons().iter().map(Neuron::bias))
    }

    /// Every weight in canonical link order.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.links.iter().map(Link::weight)
    }

    /// Writes one sample into the input nodes. Cached energies are left alone.
    pub(crate) fn set_inputs(&mut self, sample: &[f64]) {
        for (input, &value) in self.inputs.iter_mut().zip(sample) {
            input.set_signal(value);
        }
    }

    pub(crate) fn reset_forward(&mut self) {
        self.layers.iter_mut().for_each(Layer::reset_energies);
    }

    pub(crate) fn reset_backward(&mut self) {
        self.layers.iter_mut().for_each(Layer::reset_errors);
    }

    /// Signal a node currently emits. Neurons must already hold a valid energy.
    pub(crate) fn settled_signal(&self, node: NodeRef) -> f64 {
        match node {
            NodeRef::Input(index) => self.inputs[index].value(),
            NodeRef::Neuron(r) => self.neuron(r).settled_energy(),
        }
    }

    /// `f(Σ weight · signal(source) + bias)` over the neuron's incoming links.
    pub(crate) fn activate(&self, neuron: NeuronRef, activation: ActivationFunction) -> Result<f64> {
        let node = self.neuron(neuron);
        let sum: f64 = node.incoming().iter()
            .map(|&id| {
                let link = self.link(id);
                link.weight() * self.settled_signal(link.source())
            })
            .sum();
        let energy = activation.function(sum + node.bias());
        if !energy.is_finite() {
            return Err(NetError::NonFiniteEnergy { layer: neuron.layer, index: neuron.index });
        }
        Ok(energy)
    }

    /// `f'(energy) · Σ weight · error(target)` over the neuron's outgoing links.
    pub(crate) fn back_propagate(&self, neuron: NeuronRef, activation: ActivationFunction) -> Result<f64> {
        let node = self.neuron(neuron);
        let sum: f64 = node.outgoing().iter()
            .map(|&id| {
                let link = self.link(id);
                link.weight() * self.neuron(link.target()).settled_error()
            })
            .sum();
        let error = activation.derivative_from_output(node.settled_energy()) * sum;
        if !error.is_finite() {
            return Err(NetError::NonFiniteEnergy { layer: neuron.layer, index: neuron.index });
        }
        Ok(error)
    }

    /// `error(target) · signal(source)`: the loss gradient with respect to one weight.
    pub(crate) fn weight_gradient(&self, id: LinkId) -> f64 {
        let link = self.link(id);
        self.neuron(link.target()).settled_error() * self.settled_signal(link.source())
    }

    pub(crate) fn shift_weight(&mut self, id: LinkId, delta: f64) {
        self.links[id.0].shift_weight(delta);
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::init::RandomParams;

    /// Hands out 1, 2, 3, ... so every scalar's position is visible.
    struct Counting(f64);

    impl ParamSource for Counting {
        fn next_bias(&mut self) -> Result<f64> {
            self.0 += 1.0;
            Ok(self.0)
        }
        fn next_weight(&mut self) -> Result<f64> {
            self.next_bias()
        }
    }

    #[test]
    fn test_shape_matches_spec() {
        let spec = TopologySpec::new(3, 2, vec![4, 3], 2).with_seed(1);
        let graph = NodeGraph::build(&spec, &mut RandomParams::new(&spec)).unwrap();

        assert_eq!(graph.input_count(), 6);
        assert_eq!(graph.layer_count(), 3);
        assert_eq!(graph.layer(0).size(), 4);
        assert_eq!(graph.layer(1).size(), 3);
        assert_eq!(graph.output_layer().size(), 2);
        assert_eq!(graph.output_layer().role(), LayerRole::Output);
        assert_eq!(graph.links().len(), spec.weight_count());
        assert_eq!(graph.biases().count(), spec.bias_count());
    }

    #[test]
    fn test_canonical_order() {
        // 2 inputs -> [2] -> 2 outputs: biases 1..=4, then weights 5..=12
        let spec = TopologySpec::new(2, 1, vec![2], 2);
        let graph = NodeGraph::build(&spec, &mut Counting(0.0)).unwrap();

        assert_eq!(graph.biases().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(graph.layer(0).neuron(1).bias(), 2.0);
        assert_eq!(graph.output_layer().neuron(0).bias(), 3.0);

        // input-major block first
        assert_eq!(graph.links()[1].source(), NodeRef::Input(0));
        assert_eq!(graph.links()[1].target(), NeuronRef::new(0, 1));
        assert_eq!(graph.links()[1].weight(), 6.0);
        // then hidden -> output, hidden-major
        assert_eq!(graph.links()[5].source(), NodeRef::Neuron(NeuronRef::new(0, 0)));
        assert_eq!(graph.links()[5].target(), NeuronRef::new(1, 1));
        assert_eq!(graph.links()[5].weight(), 10.0);
    }

    #[test]
    fn test_inter_hidden_and_shortcut_blocks_come_last() {
        let spec = TopologySpec::new(1, 1, vec![2, 3], 1).with_shortcut_links(true);
        let blocks = link_blocks(&spec);
        assert_eq!(
            blocks,
            vec![
                LinkBlock { source_layer: None, sources: 1, target_layer: 0, targets: 2 },
                LinkBlock { source_layer: Some(1), sources: 3, target_layer: 2, targets: 1 },
                LinkBlock { source_layer: Some(0), sources: 2, target_layer: 1, targets: 3 },
                LinkBlock { source_layer: None, sources: 1, target_layer: 2, targets: 1 },
            ]
        );
        assert_eq!(blocks.iter().map(LinkBlock::len).sum::<usize>(), spec.weight_count());
    }

    #[test]
    fn test_no_blocks_without_hidden_layers() {
        let spec = TopologySpec::new(2, 2, vec![], 2).with_shortcut_links(true);
        assert!(link_blocks(&spec).is_empty());
    }

    #[test]
    fn test_adjacency_lists() {
        let spec = TopologySpec::new(2, 2, vec![3, 2], 2).with_seed(3);
        let graph = NodeGraph::build(&spec, &mut RandomParams::new(&spec)).unwrap();

        let first_hidden = graph.neuron(NeuronRef::new(0, 0));
        assert_eq!(first_hidden.incoming().len(), 4);
        assert_eq!(first_hidden.outgoing().len(), 2);

        let output = graph.neuron(NeuronRef::new(2, 1));
        assert_eq!(output.incoming().len(), 2);
        assert!(output.outgoing().is_empty());
        for &id in output.incoming() {
            assert_eq!(graph.link(id).target(), NeuronRef::new(2, 1));
        }
    }

    #[test]
    fn test_node_roles() {
        let spec = TopologySpec::new(1, 1, vec![1], 1);
        let graph = NodeGraph::build(&spec, &mut Counting(0.0)).unwrap();
        assert!(matches!(graph.node(NodeRef::Input(0)), Node::Input(_)));
        assert!(matches!(graph.node(NodeRef::Neuron(NeuronRef::new(0, 0))), Node::Hidden(_)));
        assert!(matches!(graph.node(NodeRef::Neuron(NeuronRef::new(1, 0))), Node::Output(_)));
    }

    #[test]
    fn test_invalid_spec_allocates_nothing() {
        let spec = TopologySpec::new(2, 2, vec![0], 2);
        assert!(matches!(
            NodeGraph::build(&spec, &mut Counting(0.0)),
            Err(NetError::InvalidTopology(_))
        ));
    }
}
