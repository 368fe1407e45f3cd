//! Layer-by-layer forward and backward passes.
//!
//! Each pass walks the neuron layers in (reverse) topological order. Within a
//! layer every stale neuron is independent, so the layer is split into chunks
//! that run on the worker pool; the next layer starts only after `join_all`
//! has returned every chunk. Tasks read a shared snapshot of the graph and
//! return their values; the caches are written afterwards, once the graph is
//! uniquely owned again.

use std::sync::Arc;

use log::debug;

use crate::activation::activation::ActivationFunction;
use crate::concurrency::pool::WorkerPool;
use crate::error::{NetError, Result};
use crate::layers::NeuronRef;
use crate::network::graph::NodeGraph;

/// Chunks handed to each worker per layer, to even out uneven task times.
const CHUNKS_PER_WORKER: usize = 4;

/// Fills every invalidated energy, inputs to outputs.
pub(crate) fn forward(
    graph: &mut Arc<NodeGraph>,
    pool: &WorkerPool,
    activation: ActivationFunction,
) -> Result<()> {
    for layer in 0..graph.layer_count() {
        let stale = graph.layer(layer).stale_energies();
        if stale.is_empty() {
            continue;
        }
        debug!("forward: layer {layer}, {} neurons", stale.len());

        let settled = scatter(graph, pool, stale, move |g, index| {
            g.activate(NeuronRef::new(layer, index), activation)
        })?;
        let g = Arc::make_mut(graph);
        for (index, energy) in settled {
            g.neuron_mut(NeuronRef::new(layer, index)).store_energy(energy);
        }
    }
    Ok(())
}

/// Fills every invalidated hidden error, last hidden layer to first.
///
/// Every output must already carry its teaching signal, and every energy must
/// be valid.
pub(crate) fn backward(
    graph: &mut Arc<NodeGraph>,
    pool: &WorkerPool,
    activation: ActivationFunction,
) -> Result<()> {
    if let Some(index) = graph.output_layer().neurons().iter().position(|n| n.error().is_none()) {
        return Err(NetError::Untaught { index });
    }

    for layer in (0..graph.output_index()).rev() {
        let stale = graph.layer(layer).stale_errors();
        if stale.is_empty() {
            continue;
        }
        debug!("backward: layer {layer}, {} neurons", stale.len());

        let settled = scatter(graph, pool, stale, move |g, index| {
            g.back_propagate(NeuronRef::new(layer, index), activation)
        })?;
        let g = Arc::make_mut(graph);
        for (index, error) in settled {
            g.neuron_mut(NeuronRef::new(layer, index)).store_error(error);
        }
    }
    Ok(())
}

/// Runs `compute` for every index on the pool and waits for all of them.
fn scatter<F>(
    graph: &Arc<NodeGraph>,
    pool: &WorkerPool,
    indices: Vec<usize>,
    compute: F,
) -> Result<Vec<(usize, f64)>>
where
    F: Fn(&NodeGraph, usize) -> Result<f64> + Copy + Send + 'static,
{
    let parts = pool.workers() * CHUNKS_PER_WORKER;
    let chunk_size = indices.len().div_ceil(parts).max(1);

    let tasks = indices.chunks(chunk_size).map(|chunk| {
        let chunk = chunk.to_vec();
        let graph = Arc::clone(graph);
        move || {
            let snapshot: &NodeGraph = &graph;
            chunk.into_iter()
                .map(|index| compute(snapshot, index).map(|value| (index, value)))
                .collect::<Result<Vec<(usize, f64)>>>()
        }
    });

    let mut settled = Vec::with_capacity(indices.len());
    for outcome in pool.join_all(tasks) {
        settled.extend(outcome??);
    }
    Ok(settled)
}
