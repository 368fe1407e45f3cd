pub mod dense;
pub mod link;
pub mod node;

pub use dense::{Layer, LayerRole};
pub use link::{Link, LinkId};
pub use node::{Consumer, InputNode, Neuron, NeuronRef, Node, NodeRef, Producer};
