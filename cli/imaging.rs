//! Turns image files into input samples for a network.
//!
//! Images are decoded (PNG/JPEG/BMP/GIF), converted to grayscale, resized
//! exactly to the input grid and normalized into the activation's domain.

use std::error::Error;
use std::path::Path;

use glyph_nn::{ActivationFunction, TopologySpec};

pub struct ImageSource {
    width: u32,
    height: u32,
    activation: ActivationFunction,
}

impl ImageSource {
    pub fn for_spec(spec: &TopologySpec) -> Result<ImageSource, Box<dyn Error>> {
        Ok(ImageSource {
            width: u32::try_from(spec.input_width)?,
            height: u32::try_from(spec.input_height)?,
            activation: spec.activation,
        })
    }

    /// Returns a flat row-major `Vec<f64>` of length `width * height`.
    pub fn sample(&self, path: &Path) -> Result<Vec<f64>, Box<dyn Error>> {
        let img = image::open(path)?;
        let resized = img.resize_exact(self.width, self.height, image::imageops::FilterType::Lanczos3);
        let gray = resized.to_luma8();
        Ok(gray.pixels().map(|p| self.normalize(p.0[0] as f64 / 255.0)).collect())
    }

    /// Maps a [0, 1] intensity into the range the activation's outputs live in.
    fn normalize(&self, intensity: f64) -> f64 {
        match self.activation {
            ActivationFunction::Sigmoid => intensity,
            ActivationFunction::Tanh => intensity * 2.0 - 1.0,
        }
    }
}
