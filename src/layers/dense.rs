use crate::layers::node::Neuron;

/// Whether a layer sits between the inputs and the outputs or is the output layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Hidden,
    Output,
}

/// One layer of neurons, densely fed by the layer before it.
#[derive(Debug, Clone)]
pub struct Layer {
    role: LayerRole,
    neurons: Vec<Neuron>,
}

impl Layer {
    pub(crate) fn new(role: LayerRole, biases: Vec<f64>) -> Layer {
        Layer {
            role,
            neurons: biases.into_iter().map(Neuron::new).collect(),
        }
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn size(&self) -> usize {
        self.neurons.len()
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neuron(&self, index: usize) -> &Neuron {
        &self.neurons[index]
    }

    pub(crate) fn neuron_mut(&mut self, index: usize) -> &mut Neuron {
        &mut self.neurons[index]
    }

    pub(crate) fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    /// Indices of neurons whose energy still has to be computed.
    pub(crate) fn stale_energies(&self) -> Vec<usize> {
        self.neurons.iter().enumerate()
            .filter(|(_, n)| n.energy().is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of neurons whose error still has to be computed.
    pub(crate) fn stale_errors(&self) -> Vec<usize> {
        self.neurons.iter().enumerate()
            .filter(|(_, n)| n.error().is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn reset_energies(&mut self) {
        self.neurons.iter_mut().for_each(Neuron::reset_energy);
    }

    pub(crate) fn reset_errors(&mut self) {
        self.neurons.iter_mut().for_each(Neuron::reset_error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_lists_follow_caches() {
        let mut layer = Layer::new(LayerRole::Hidden, vec![0.0, 0.1, 0.2]);
        assert_eq!(layer.stale_energies(), vec![0, 1, 2]);

        layer.neuron_mut(1).store_energy(0.4);
        assert_eq!(layer.stale_energies(), vec![0, 2]);

        layer.reset_energies();
        assert_eq!(layer.stale_energies(), vec![0, 1, 2]);
        assert_eq!(layer.stale_errors(), vec![0, 1, 2]);
    }

    #[test]
    fn test_biases_land_in_order() {
        let layer = Layer::new(LayerRole::Output, vec![0.5, -0.5]);
        assert_eq!(layer.role(), LayerRole::Output);
        assert_eq!(layer.size(), 2);
        assert_eq!(layer.neuron(1).bias(), -0.5);
    }
}
