use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::error::{NetError, Result};

/// Shape and initialization of a network.
///
/// The persisted model file carries no shape information, so the same
/// `TopologySpec` used when a model was saved must be supplied to load it.
/// Specs can be stored next to the model as JSON.
///
/// Fields:
/// - `input_width`, `input_height` — size of the input grid (one input node per cell)
/// - `hidden_layers`  — width of each hidden layer, first to last; at least one
/// - `classes`        — number of output neurons
/// - `weight_range`   — inclusive `(low, high)` for fresh link weights
/// - `bias_range`     — inclusive `(low, high)` for fresh neuron biases
/// - `shortcut_links` — also connect every input straight to every output
/// - `seed`           — fixed RNG seed for reproducible fresh builds
/// - `labels`         — optional human-readable name per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySpec {
    pub input_width: usize,
    pub input_height: usize,
    pub hidden_layers: Vec<usize>,
    pub classes: usize,
    pub weight_range: (f64, f64),
    pub bias_range: (f64, f64),
    #[serde(default)]
    pub activation: ActivationFunction,
    #[serde(default)]
    pub shortcut_links: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

impl Default for TopologySpec {
    /// 20×20 glyph grid, one hidden layer, one class per letter `a`..`z`.
    fn default() -> Self {
        TopologySpec {
            input_width: 20,
            input_height: 20,
            hidden_layers: vec![256],
            classes: 26,
            weight_range: (-1.0, 1.0),
            bias_range: (-0.1, 0.1),
            activation: ActivationFunction::Sigmoid,
            shortcut_links: false,
            seed: None,
            labels: Some(('a'..='z').map(String::from).collect()),
        }
    }
}

impl TopologySpec {
    /// A spec with the default ranges and activation and no labels.
    pub fn new(input_width: usize, input_height: usize, hidden_layers: Vec<usize>, classes: usize) -> Self {
        TopologySpec {
            input_width,
            input_height,
            hidden_layers,
            classes,
            labels: None,
            ..TopologySpec::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_activation(mut self, activation: ActivationFunction) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_ranges(mut self, weight_range: (f64, f64), bias_range: (f64, f64)) -> Self {
        self.weight_range = weight_range;
        self.bias_range = bias_range;
        self
    }

    pub fn with_shortcut_links(mut self, enabled: bool) -> Self {
        self.shortcut_links = enabled;
        self
    }

    /// Rejects shapes that cannot be built. Nothing is allocated before this passes.
    pub fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(invalid(format!(
                "input grid {}x{} has no cells", self.input_width, self.input_height
            )));
        }
        if self.hidden_layers.is_empty() {
            return Err(invalid("at least one hidden layer is required".to_string()));
        }
        if let Some(pos) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(invalid(format!("hidden layer {pos} has zero width")));
        }
        if self.classes == 0 {
            return Err(invalid("at least one output class is required".to_string()));
        }
        if self.checked_scalar_count().is_none() {
            return Err(invalid("topology is too large to address".to_string()));
        }
        check_range("weight_range", self.weight_range)?;
        check_range("bias_range", self.bias_range)?;
        if let Some(labels) = &self.labels {
            if labels.len() != self.classes {
                return Err(invalid(format!(
                    "{} labels given for {} classes", labels.len(), self.classes
                )));
            }
        }
        Ok(())
    }

    pub fn input_size(&self) -> usize {
        self.input_width * self.input_height
    }

    /// Widths of all neuron layers: every hidden layer, then the output layer.
    pub fn neuron_layer_sizes(&self) -> Vec<usize> {
        let mut sizes = self.hidden_layers.clone();
        sizes.push(self.classes);
        sizes
    }

    pub fn bias_count(&self) -> usize {
        self.hidden_layers.iter().sum::<usize>() + self.classes
    }

    /// Number of links. Sizes are not overflow-checked; run `validate` on untrusted specs first.
    pub fn weight_count(&self) -> usize {
        let first = self.hidden_layers.first().copied().unwrap_or(0);
        let last = self.hidden_layers.last().copied().unwrap_or(0);
        let between: usize = self.hidden_layers.windows(2).map(|w| w[0] * w[1]).sum();
        let shortcuts = if self.shortcut_links { self.input_size() * self.classes } else { 0 };
        self.input_size() * first + last * self.classes + between + shortcuts
    }

    /// Number of scalars a persisted model of this shape holds.
    pub fn scalar_count(&self) -> usize {
        self.bias_count() + self.weight_count()
    }

    /// `scalar_count` with every step checked, including the byte length of the
    /// persisted stream. `None` if anything overflows `usize`.
    fn checked_scalar_count(&self) -> Option<usize> {
        let inputs = self.input_width.checked_mul(self.input_height)?;
        let first = *self.hidden_layers.first()?;
        let last = *self.hidden_layers.last()?;

        let mut total = self.hidden_layers.iter().try_fold(self.classes, |acc, &w| acc.checked_add(w))?;
        total = total.checked_add(inputs.checked_mul(first)?)?;
        total = total.checked_add(last.checked_mul(self.classes)?)?;
        for pair in self.hidden_layers.windows(2) {
            total = total.checked_add(pair[0].checked_mul(pair[1])?)?;
        }
        if self.shortcut_links {
            total = total.checked_add(inputs.checked_mul(self.classes)?)?;
        }
        total.checked_mul(std::mem::size_of::<f64>())?;
        Some(total)
    }

    /// Display name of a class: its label if one is configured, otherwise its index.
    pub fn label(&self, class: usize) -> String {
        self.labels.as_ref()
            .and_then(|labels| labels.get(class).cloned())
            .unwrap_or_else(|| class.to_string())
    }

    /// Position of `label` among the configured labels.
    pub fn class_of(&self, label: &str) -> Option<usize> {
        self.labels.as_ref()?.iter().position(|l| l == label)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a `TopologySpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<TopologySpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: TopologySpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}

fn invalid(reason: String) -> NetError {
    NetError::InvalidTopology(reason)
}

fn check_range(name: &str, (low, high): (f64, f64)) -> Result<()> {
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(invalid(format!("{name} ({low}, {high}) is not a finite ordered range")));
    }
    Ok(())
}
