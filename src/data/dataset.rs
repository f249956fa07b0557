use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One decoded image in CHW layout with its class index.
/// Pixel values are already scaled to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    pub pixels: Vec<f32>,
    /// [channels, height, width]
    pub shape:  [usize; 3],
    pub label:  usize,
}

impl ImageSample {
    pub fn new(pixels: Vec<f32>, shape: [usize; 3], label: usize) -> Self {
        debug_assert_eq!(pixels.len(), shape.iter().product::<usize>());
        Self { pixels, shape, label }
    }
}

pub struct ImageDataset {
    samples: Vec<ImageSample>,
}

impl ImageDataset {
    pub fn new(samples: Vec<ImageSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ImageSample> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
