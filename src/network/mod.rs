pub mod graph;
pub(crate) mod init;
pub mod network;
mod passes;
pub mod spec;

pub use graph::{link_blocks, LinkBlock, NodeGraph};
pub use network::{argmax, Network};
pub use spec::TopologySpec;
