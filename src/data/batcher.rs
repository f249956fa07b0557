// ============================================================
// Layer 4 — Image Batcher and Data Loaders
// ============================================================
// Implements Burn's Batcher trait to stack ImageSamples into
// one image tensor and one label tensor.
//
//   Input:  Vec of N ImageSamples, each [C, H, W]
//   Output: ImageBatch with images [N, C, H, W], labels [N]
//
// All samples of a dataset share one shape (the loader resizes
// every image), so the shape of the first item is used.
//
// Reference: Burn Book §4 (Batcher)

use std::sync::Arc;

use burn::{
    data::dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::dataset::{ImageDataset, ImageSample};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// shape: [batch_size], one class index per image
    pub labels: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so every batch is created on it.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageSample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> ImageBatch<B> {
        let batch_size = items.len();
        let [channels, height, width] = items[0].shape;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, channels, height, width]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, labels }
    }
}

// ─── Loaders ──────────────────────────────────────────────────────────────────
/// Training loader: reshuffled every epoch from a seeded RNG.
pub fn build_train_loader<B: Backend>(
    dataset:     ImageDataset,
    batch_size:  usize,
    num_workers: usize,
    seed:        u64,
    device:      B::Device,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    DataLoaderBuilder::new(ImageBatcher::<B>::new(device))
        .batch_size(batch_size)
        .shuffle(seed)
        .num_workers(num_workers)
        .build(dataset)
}

/// Test loader: dataset order, identical on every pass.
pub fn build_test_loader<B: Backend>(
    dataset:     ImageDataset,
    batch_size:  usize,
    num_workers: usize,
    device:      B::Device,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    DataLoaderBuilder::new(ImageBatcher::<B>::new(device))
        .batch_size(batch_size)
        .num_workers(num_workers)
        .build(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sample(value: f32, label: usize) -> ImageSample {
        ImageSample::new(vec![value; 3 * 2 * 2], [3, 2, 2], label)
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(0.1, 0), sample(0.9, 1), sample(0.5, 1)]);
        assert_eq!(batch.images.dims(), [3, 3, 2, 2]);
        assert_eq!(batch.labels.dims(), [3]);
    }

    #[test]
    fn test_test_loader_keeps_order_and_short_last_batch() {
        let samples: Vec<ImageSample> = (0..5).map(|i| sample(i as f32, i % 2)).collect();
        let loader  = build_test_loader::<TestBackend>(
            ImageDataset::new(samples), 2, 1, Default::default(),
        );
        let sizes: Vec<usize> = loader.iter().map(|b| b.labels.dims()[0]).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
