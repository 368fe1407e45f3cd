use crate::layers::link::LinkId;

/// Stable handle to a neuron: `layer` counts neuron layers only (hidden layers
/// first, the output layer last), `index` is the position inside that layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeuronRef {
    pub layer: usize,
    pub index: usize,
}

impl NeuronRef {
    pub fn new(layer: usize, index: usize) -> Self {
        NeuronRef { layer, index }
    }
}

/// Handle to any node that can feed a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Input(usize),
    Neuron(NeuronRef),
}

/// Something that emits a signal along its outgoing links.
pub trait Producer {
    /// The node's current output, or `None` while its cache is invalidated.
    fn signal(&self) -> Option<f64>;
}

/// Something that accepts back-propagated error from its outgoing links.
pub trait Consumer {
    fn accepted_error(&self) -> Option<f64>;
}

/// One cell of the input grid. Its signal is set from outside before every evaluation.
#[derive(Debug, Clone, Default)]
pub struct InputNode {
    signal: f64,
}

impl InputNode {
    pub fn value(&self) -> f64 {
        self.signal
    }

    pub(crate) fn set_signal(&mut self, signal: f64) {
        self.signal = signal;
    }
}

impl Producer for InputNode {
    fn signal(&self) -> Option<f64> {
        Some(self.signal)
    }
}

/// A hidden or output neuron with its memoized forward and backward state.
///
/// `energy` is `Some` between the forward pass that computed it and the next
/// forward reset; `error` likewise for the backward pass. Output neurons also
/// remember the target they were last taught.
#[derive(Debug, Clone)]
pub struct Neuron {
    bias: f64,
    energy: Option<f64>,
    error: Option<f64>,
    target: Option<f64>,
    incoming: Vec<LinkId>,
    outgoing: Vec<LinkId>,
}

impl Neuron {
    pub(crate) fn new(bias: f64) -> Self {
        Neuron {
            bias,
            energy: None,
            error: None,
            target: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn energy(&self) -> Option<f64> {
        self.energy
    }

    pub fn error(&self) -> Option<f64> {
        self.error
    }

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    pub fn incoming(&self) -> &[LinkId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[LinkId] {
        &self.outgoing
    }

    /// Cached energy of a neuron that an earlier layer of the pass already filled.
    ///
    /// # Panics
    /// Panics if the cache is invalid: the passes never read a layer they have not finished.
    pub(crate) fn settled_energy(&self) -> f64 {
        match self.energy {
            Some(energy) => energy,
            None => panic!("energy read from an invalidated cache"),
        }
    }

    /// # Panics
    /// Panics if the cache is invalid, see [`Neuron::settled_energy`].
    pub(crate) fn settled_error(&self) -> f64 {
        match self.error {
            Some(error) => error,
            None => panic!("error read from an invalidated cache"),
        }
    }

    pub(crate) fn store_energy(&mut self, energy: f64) {
        self.energy = Some(energy);
    }

    pub(crate) fn store_error(&mut self, error: f64) {
        self.error = Some(error);
    }

    pub(crate) fn teach(&mut self, target: f64, error: f64) {
        self.target = Some(target);
        self.error = Some(error);
    }

    pub(crate) fn reset_energy(&mut self) {
        self.energy = None;
    }

    pub(crate) fn reset_error(&mut self) {
        self.error = None;
        self.target = None;
    }

    pub(crate) fn shift_bias(&mut self, delta: f64) {
        self.bias += delta;
    }

    pub(crate) fn attach_incoming(&mut self, link: LinkId) {
        self.incoming.push(link);
    }

    pub(crate) fn attach_outgoing(&mut self, link: LinkId) {
        self.outgoing.push(link);
    }
}

impl Producer for Neuron {
    fn signal(&self) -> Option<f64> {
        self.energy
    }
}

impl Consumer for Neuron {
    fn accepted_error(&self) -> Option<f64> {
        self.error
    }
}

/// Role-tagged view of a node, as returned by `NodeGraph::node`.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Input(&'a InputNode),
    Hidden(&'a Neuron),
    Output(&'a Neuron),
}

impl<'a> Node<'a> {
    pub fn emit_signal(&self) -> Option<f64> {
        match self {
            Node::Input(input) => input.signal(),
            Node::Hidden(neuron) | Node::Output(neuron) => neuron.signal(),
        }
    }

    /// Inputs never consume error, so they always answer `None`.
    pub fn accept_error(&self) -> Option<f64> {
        match self {
            Node::Input(_) => None,
            Node::Hidden(neuron) | Node::Output(neuron) => neuron.accepted_error(),
        }
    }

    pub fn as_neuron(&self) -> Option<&'a Neuron> {
        match self {
            Node::Input(_) => None,
            Node::Hidden(neuron) | Node::Output(neuron) => Some(neuron),
        }
    }
}
