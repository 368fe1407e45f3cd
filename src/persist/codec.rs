//! Binary model format: a flat run of little-endian IEEE-754 doubles, no header.
//!
//! Order: hidden biases (layer-major, neuron-minor), output biases, then every
//! weight in canonical link order (see [`link_blocks`](crate::network::graph::link_blocks)).
//! The shape is not stored; readers must supply the `TopologySpec` the model was
//! written with.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::info;

use crate::error::{NetError, Result};
use crate::network::graph::NodeGraph;
use crate::network::init::ParamSource;
use crate::network::spec::TopologySpec;

/// Writes every bias and weight of `graph` in canonical order.
pub fn write_model<W: Write>(graph: &NodeGraph, mut writer: W) -> Result<()> {
    for value in graph.biases().chain(graph.weights()) {
        writer.write_f64::<LittleEndian>(value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Rebuilds the topology of `spec`, taking each bias and weight from `reader`.
///
/// Fails with `FormatMismatch` if the stream runs out early. Bytes after the
/// last required scalar are never read.
pub fn read_model<R: Read>(reader: R, spec: &TopologySpec) -> Result<NodeGraph> {
    spec.validate()?;
    let mut source = StreamParams { reader, read: 0, expected: spec.scalar_count() };
    NodeGraph::build(spec, &mut source)
}

pub fn save_file(graph: &NodeGraph, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    write_model(graph, writer)?;
    info!("saved model to {}", path.display());
    Ok(())
}

pub fn load_file(path: &Path, spec: &TopologySpec) -> Result<NodeGraph> {
    let reader = BufReader::new(File::open(path)?);
    let graph = read_model(reader, spec)?;
    info!("loaded model from {}", path.display());
    Ok(graph)
}

struct StreamParams<R> {
    reader: R,
    read: usize,
    expected: usize,
}

impl<R: Read> StreamParams<R> {
    fn next(&mut self) -> Result<f64> {
        match self.reader.read_f64::<LittleEndian>() {
            Ok(value) => {
                self.read += 1;
                Ok(value)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(NetError::FormatMismatch {
                expected: self.expected,
                read: self.read,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Read> ParamSource for StreamParams<R> {
    fn next_bias(&mut self) -> Result<f64> {
        self.next()
    }

    fn next_weight(&mut self) -> Result<f64> {
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::init::RandomParams;

    fn seeded_graph(spec: &TopologySpec) -> NodeGraph {
        NodeGraph::build(spec, &mut RandomParams::new(spec)).unwrap()
    }

    #[test]
    fn test_stream_length_matches_spec() {
        let spec = TopologySpec::new(3, 3, vec![4, 2], 3).with_seed(5);
        let mut bytes = Vec::new();
        write_model(&seeded_graph(&spec), &mut bytes).unwrap();
        assert_eq!(bytes.len(), spec.scalar_count() * 8);
    }

    #[test]
    fn test_round_trip_is_bitwise() {
        let spec = TopologySpec::new(3, 2, vec![4, 3], 2).with_seed(11).with_shortcut_links(true);
        let graph = seeded_graph(&spec);
        let mut bytes = Vec::new();
        write_model(&graph, &mut bytes).unwrap();

        let loaded = read_model(bytes.as_slice(), &spec).unwrap();
        let bits = |g: &NodeGraph| g.biases().chain(g.weights()).map(f64::to_bits).collect::<Vec<_>>();
        assert_eq!(bits(&loaded), bits(&graph));
    }

    #[test]
    fn test_first_scalars_are_biases() {
        let spec = TopologySpec::new(1, 1, vec![2], 1).with_seed(2);
        let graph = seeded_graph(&spec);
        let mut bytes = Vec::new();
        write_model(&graph, &mut bytes).unwrap();

        let mut reader = bytes.as_slice();
        let first = reader.read_f64::<LittleEndian>().unwrap();
        assert_eq!(first, graph.layer(0).neuron(0).bias());
    }

    #[test]
    fn test_short_stream_is_format_mismatch() {
        let spec = TopologySpec::new(2, 2, vec![3], 2).with_seed(8);
        let mut bytes = Vec::new();
        write_model(&seeded_graph(&spec), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 12);

        match read_model(bytes.as_slice(), &spec) {
            Err(NetError::FormatMismatch { expected, read }) => {
                assert_eq!(expected, spec.scalar_count());
                assert_eq!(read, spec.scalar_count() - 2);
            }
            other => panic!("expected FormatMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let spec = TopologySpec::new(2, 2, vec![3], 2).with_seed(8);
        let graph = seeded_graph(&spec);
        let mut bytes = Vec::new();
        write_model(&graph, &mut bytes).unwrap();
        bytes.extend_from_slice(&[0xAB; 20]);

        let loaded = read_model(bytes.as_slice(), &spec).unwrap();
        assert_eq!(loaded.weights().collect::<Vec<_>>(), graph.weights().collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let spec = TopologySpec::new(2, 2, vec![3], 2);
        let result = load_file(Path::new("/nonexistent/glyph/model.bin"), &spec);
        assert!(matches!(result, Err(NetError::Io(_))));
    }
}
