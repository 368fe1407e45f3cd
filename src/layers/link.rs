use crate::layers::node::{NeuronRef, NodeRef};

/// Position of a link in the graph's flat link arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A weighted edge. Endpoints are fixed at construction; only the weight moves.
#[derive(Debug, Clone)]
pub struct Link {
    source: NodeRef,
    target: NeuronRef,
    weight: f64,
}

impl Link {
    pub(crate) fn new(source: NodeRef, target: NeuronRef, weight: f64) -> Self {
        Link { source, target, weight }
    }

    pub fn source(&self) -> NodeRef {
        self.source
    }

    pub fn target(&self) -> NeuronRef {
        self.target
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub(crate) fn shift_weight(&mut self, delta: f64) {
        self.weight += delta;
    }
}
