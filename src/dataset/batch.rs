//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` trait and `Batcher` over the in-memory scan
//! collection so the training loop can draw shuffled mini-batches.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{IMG_HEIGHT, IMG_WIDTH};

/// A single scan ready for Burn
///
/// Scans are held fully decoded since the balancing step interpolates over
/// raw pixel vectors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MriItem {
    /// Image data as flattened CHW float array [3 * H * W], rescaled to [0, 1]
    pub image: Vec<f32>,
    /// Class label (0-3)
    pub label: usize,
    /// Whether this sample was synthesized by SMOTE
    pub synthetic: bool,
}

impl MriItem {
    /// Create an item from pre-loaded image data
    pub fn new(image: Vec<f32>, label: usize) -> Self {
        Self {
            image,
            label,
            synthetic: false,
        }
    }
}

/// In-memory dataset implementing Burn's `Dataset` trait
#[derive(Debug, Clone)]
pub struct MriBurnDataset {
    items: Vec<MriItem>,
}

impl MriBurnDataset {
    /// Create a dataset from loaded items
    pub fn new(items: Vec<MriItem>) -> Self {
        Self { items }
    }

    /// Get samples per class count
    pub fn class_distribution(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for item in &self.items {
            if item.label < num_classes {
                counts[item.label] += 1;
            }
        }
        counts
    }

    /// Access the underlying items
    pub fn items(&self) -> &[MriItem] {
        &self.items
    }
}

impl Dataset<MriItem> for MriBurnDataset {
    fn get(&self, index: usize) -> Option<MriItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of scans for training
#[derive(Clone, Debug)]
pub struct MriBatch<B: Backend> {
    /// Batch of images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Batch of labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher for creating training batches
///
/// Items arrive already rescaled to [0, 1], matching the 1/255 rescaling
/// applied at load time; no further normalization is performed here.
#[derive(Clone, Debug)]
pub struct MriBatcher {
    height: usize,
    width: usize,
}

impl Default for MriBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MriBatcher {
    /// Create a new batcher for the default scan geometry
    pub fn new() -> Self {
        Self {
            height: IMG_HEIGHT,
            width: IMG_WIDTH,
        }
    }

    /// Create a batcher with custom image geometry
    pub fn with_size(height: usize, width: usize) -> Self {
        Self { height, width }
    }
}

impl<B: Backend> Batcher<B, MriItem, MriBatch<B>> for MriBatcher {
    fn batch(&self, items: Vec<MriItem>, device: &B::Device) -> MriBatch<B> {
        let batch_size = items.len();
        let channels = 3;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, self.height, self.width]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        MriBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_item(label: usize) -> MriItem {
        MriItem::new(vec![0.5f32; 3 * IMG_HEIGHT * IMG_WIDTH], label)
    }

    #[test]
    fn test_item_creation() {
        let item = dummy_item(3);

        assert_eq!(item.label, 3);
        assert!(!item.synthetic);
        assert_eq!(item.image.len(), 3 * IMG_HEIGHT * IMG_WIDTH);
    }

    #[test]
    fn test_dataset_access() {
        let dataset = MriBurnDataset::new(vec![dummy_item(0), dummy_item(1), dummy_item(1)]);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get(1).unwrap().label, 1);
        assert!(dataset.get(3).is_none());
        assert_eq!(dataset.class_distribution(4), vec![1, 2, 0, 0]);
    }

    #[cfg(all(feature = "ndarray", not(feature = "wgpu")))]
    #[test]
    fn test_batcher_shapes() {
        use crate::backend::DefaultBackend;

        let batcher = MriBatcher::new();
        let device = Default::default();
        let batch: MriBatch<DefaultBackend> =
            batcher.batch(vec![dummy_item(0), dummy_item(2)], &device);

        assert_eq!(batch.images.dims(), [2, 3, IMG_HEIGHT, IMG_WIDTH]);
        assert_eq!(batch.targets.dims(), [2]);
    }
}
