//! Burn dataset and batcher integration.
//!
//! `ImageItem` carries one decoded sample as a flat CHW float buffer;
//! `ImageBatcher` stacks items into the `[batch, channel, height, width]`
//! tensor and the `[batch]` integer target tensor one gradient step or one
//! evaluation pass consumes. Batch size is decided by the caller; the final
//! batch of a partition may be short.

use std::marker::PhantomData;
use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use image::ImageReader;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single decoded sample ready for batching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageItem {
    /// Image data as a flattened CHW float array, values in [0, 1]
    pub image: Vec<f32>,
    /// Class label index in [0, num_classes)
    pub label: usize,
}

impl ImageItem {
    /// Load and decode an image file, resizing to `image_size` square RGB.
    pub fn from_path(path: &Path, label: usize, image_size: usize) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| Error::Data(format!("failed to open {:?}: {}", path, e)))?
            .decode()
            .map_err(|e| Error::Data(format!("failed to decode {:?}: {}", path, e)))?
            .resize_exact(image_size as u32, image_size as u32, FilterType::Triangle)
            .to_rgb8();

        let (width, height) = (image_size, image_size);
        let mut image = vec![0.0f32; 3 * height * width];

        // CHW layout, scaled to [0, 1]
        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x as u32, y as u32);
                image[y * width + x] = pixel[0] as f32 / 255.0;
                image[height * width + y * width + x] = pixel[1] as f32 / 255.0;
                image[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(Self { image, label })
    }

    /// Create from pre-decoded image data.
    pub fn from_data(image: Vec<f32>, label: usize) -> Self {
        Self { image, label }
    }
}

/// A batch of images and targets on the given backend.
#[derive(Clone, Debug)]
pub struct ImageBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher stacking `ImageItem`s into an `ImageBatch`.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    image_size: usize,
    _backend: PhantomData<B>,
}

impl<B: Backend> ImageBatcher<B> {
    /// Create a batcher for the given square image size.
    pub fn new(image_size: usize) -> Self {
        Self {
            image_size,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        let batch_size = items.len();
        let channels = 3;
        let height = self.image_size;
        let width = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ImageBatch { images, targets }
    }
}

/// A dataset held fully in memory.
///
/// Used for preloaded training partitions and for synthetic fixtures in
/// tests, where every sample is constructed rather than read from disk.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDataset {
    items: Vec<ImageItem>,
}

impl InMemoryDataset {
    pub fn new(items: Vec<ImageItem>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: ImageItem) {
        self.items.push(item);
    }

    /// Number of classes inferred from the highest label present.
    pub fn num_classes(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.label)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }
}

impl Dataset<ImageItem> for InMemoryDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn item(label: usize, fill: f32, size: usize) -> ImageItem {
        ImageItem::from_data(vec![fill; 3 * size * size], label)
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(32);

        let items = vec![item(0, 0.1, 32), item(1, 0.9, 32), item(0, 0.5, 32)];
        let batch = batcher.batch(items, &device);

        assert_eq!(batch.images.dims(), [3, 3, 32, 32]);
        assert_eq!(batch.targets.dims(), [3]);
    }

    #[test]
    fn test_short_final_batch() {
        let device = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(8);

        let batch = batcher.batch(vec![item(1, 0.0, 8)], &device);
        assert_eq!(batch.images.dims(), [1, 3, 8, 8]);

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![1]);
    }

    #[test]
    fn test_in_memory_dataset() {
        let dataset = InMemoryDataset::new(vec![item(0, 0.0, 4), item(2, 0.0, 4)]);

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.num_classes(), 3);
        assert_eq!(dataset.get(1).unwrap().label, 2);
        assert!(dataset.get(2).is_none());
    }
}
