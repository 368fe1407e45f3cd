use crate::layers::LinkId;
use crate::network::graph::NodeGraph;

/// Plain single-sample gradient descent.
///
/// With `error` the loss gradient at a neuron's pre-activation sum, one step is
/// `weight -= lr · error(target) · signal(source)` for every link and
/// `bias -= lr · error` for every neuron.
#[derive(Debug, Clone, Copy)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update to every weight and bias of `graph`.
    ///
    /// Requires valid energies and errors everywhere; both are stale afterwards
    /// and must be reset by the caller.
    pub(crate) fn step(&self, graph: &mut NodeGraph) {
        for index in 0..graph.links().len() {
            let id = LinkId(index);
            let delta = -self.learning_rate * graph.weight_gradient(id);
            graph.shift_weight(id, delta);
        }
        for layer in graph.layers_mut() {
            for neuron in layer.neurons_mut() {
                let delta = -self.learning_rate * neuron.settled_error();
                neuron.shift_bias(delta);
            }
        }
    }
}
